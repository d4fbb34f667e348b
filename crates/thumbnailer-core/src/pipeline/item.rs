//! The unit of work handed from stage to stage.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::path::{Path, PathBuf};

/// One image in flight: the source it came from and its current raster.
///
/// Items are moved through the pipeline channels, so whichever stage holds an
/// item is the only one that can touch its raster.
#[derive(Debug)]
pub struct WorkItem {
    source: PathBuf,
    image: DynamicImage,
    format: ImageFormat,
}

impl WorkItem {
    /// Create an item for a freshly decoded source.
    pub fn new(source: PathBuf, image: DynamicImage, format: ImageFormat) -> Self {
        Self {
            source,
            image,
            format,
        }
    }

    /// Path of the source image.
    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Format the source was encoded in.
    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Current raster dimensions.
    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    /// Replace the raster with `f(raster)`, keeping the source identity.
    ///
    /// On failure the item is dropped and its source is returned with the error.
    pub fn try_replace_image<E>(
        self,
        f: impl FnOnce(DynamicImage) -> Result<DynamicImage, E>,
    ) -> Result<Self, (PathBuf, E)> {
        let Self {
            source,
            image,
            format,
        } = self;
        match f(image) {
            Ok(image) => Ok(Self {
                source,
                image,
                format,
            }),
            Err(e) => Err((source, e)),
        }
    }

    /// Take the item apart for the terminal stage.
    pub fn into_parts(self) -> (PathBuf, DynamicImage, ImageFormat) {
        (self.source, self.image, self.format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_keeps_source_identity() {
        let item = WorkItem::new(
            PathBuf::from("pictures/green1.jpg"),
            DynamicImage::new_rgb8(300, 200),
            ImageFormat::Jpeg,
        );

        assert_eq!(item.source(), Path::new("pictures/green1.jpg"));
        assert_eq!(item.dimensions(), (300, 200));
        assert_eq!(item.format(), ImageFormat::Jpeg);

        let (source, image, format) = item.into_parts();
        assert_eq!(source, PathBuf::from("pictures/green1.jpg"));
        assert_eq!((image.width(), image.height()), (300, 200));
        assert_eq!(format, ImageFormat::Jpeg);
    }

    #[test]
    fn test_replace_keeps_source() {
        let item = WorkItem::new(
            PathBuf::from("pictures/green1.jpg"),
            DynamicImage::new_rgb8(300, 200),
            ImageFormat::Jpeg,
        );
        let item = item
            .try_replace_image(|_| Ok::<_, String>(DynamicImage::new_rgb8(150, 100)))
            .unwrap();

        assert_eq!(item.source(), Path::new("pictures/green1.jpg"));
        assert_eq!(item.dimensions(), (150, 100));
        assert_eq!(item.format(), ImageFormat::Jpeg);
    }

    #[test]
    fn test_failed_replace_returns_source() {
        let item = WorkItem::new(
            PathBuf::from("pictures/broken.png"),
            DynamicImage::new_rgb8(4, 4),
            ImageFormat::Png,
        );
        let (source, err) = item
            .try_replace_image(|_| Err("no pixels"))
            .unwrap_err();

        assert_eq!(source, PathBuf::from("pictures/broken.png"));
        assert_eq!(err, "no pixels");
    }
}
