//! Pending image selection for a listing.
//!
//! Holds the not-yet-uploaded images, the already-stored image URLs of an
//! edited listing and the subset of those marked for deletion. Count, size
//! and type limits are always recomputed from these three collections.

use std::collections::BTreeSet;

use tracing::debug;

/// Maximum number of images a listing may show.
pub const MAX_IMAGES: usize = 6;

/// Maximum size of a single image (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// A locally selected image that has not been uploaded yet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub file_name: String,
    pub media_type: String,
    pub data: Vec<u8>,
}

impl PendingImage {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            data,
        }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Violations of the image-set limits
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ImageSetError {
    #[error("Please upload at least one image")]
    Empty,

    #[error("Please select at least one image")]
    NothingSelected,

    #[error("You can upload a maximum of 6 images")]
    TooMany {
        /// Candidates that did not fit under the cap.
        dropped: usize,
    },

    /// Same cap, worded for a listing that already has stored images.
    #[error("You can have a maximum of 6 images")]
    OverCapacity { dropped: usize },

    #[error("Only image files are allowed")]
    NotAnImage { file_name: String },

    #[error("Each image should be less than 5MB")]
    TooLarge { file_name: String },

    #[error("Image should be less than 5MB")]
    ReplacementTooLarge,

    #[error("No image at position {0}")]
    NoSuchPosition(usize),
}

/// Check a single file's type then size.
fn check_file(image: &PendingImage) -> Result<(), ImageSetError> {
    if !image.is_image() {
        return Err(ImageSetError::NotAnImage {
            file_name: image.file_name.clone(),
        });
    }
    if image.size() > MAX_IMAGE_BYTES {
        return Err(ImageSetError::TooLarge {
            file_name: image.file_name.clone(),
        });
    }
    Ok(())
}

/// Validate a prospective image set.
///
/// `visible_existing` is the number of stored images not marked for
/// deletion; it is zero for a new listing.
pub fn validate_images(pending: &[PendingImage], visible_existing: usize) -> Result<(), ImageSetError> {
    let total = pending.len() + visible_existing;
    if total == 0 {
        return Err(ImageSetError::Empty);
    }
    if total > MAX_IMAGES {
        return Err(ImageSetError::TooMany { dropped: 0 });
    }
    pending.iter().try_for_each(check_file)
}

/// Images staged for a listing
#[derive(Debug, Clone, Default)]
pub struct ImageSet {
    pending: Vec<PendingImage>,
    existing: Vec<String>,
    marked_for_deletion: BTreeSet<String>,
    editing: bool,
    error: Option<String>,
}

impl ImageSet {
    /// Empty set for a new listing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set seeded with the stored image URLs of an edited listing
    pub fn with_existing(existing: Vec<String>) -> Self {
        Self {
            existing,
            editing: true,
            ..Self::default()
        }
    }

    fn over_cap(&self, dropped: usize) -> ImageSetError {
        if self.editing {
            ImageSetError::OverCapacity { dropped }
        } else {
            ImageSetError::TooMany { dropped }
        }
    }

    fn reword(&self, err: ImageSetError) -> ImageSetError {
        match err {
            ImageSetError::TooMany { dropped } => self.over_cap(dropped),
            other => other,
        }
    }

    pub fn pending(&self) -> &[PendingImage] {
        &self.pending
    }

    pub fn existing(&self) -> &[String] {
        &self.existing
    }

    pub fn marked_for_deletion(&self) -> impl Iterator<Item = &str> {
        self.marked_for_deletion.iter().map(String::as_str)
    }

    pub fn is_marked(&self, url: &str) -> bool {
        self.marked_for_deletion.contains(url)
    }

    /// Last recorded error, for display next to the image picker
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn set_error(&mut self, message: Option<String>) {
        self.error = message;
    }

    /// Stored images still shown after pending deletions
    pub fn visible_existing(&self) -> usize {
        self.existing
            .iter()
            .filter(|url| !self.marked_for_deletion.contains(*url))
            .count()
    }

    /// Images the listing would show once everything is applied
    pub fn total(&self) -> usize {
        self.visible_existing() + self.pending.len()
    }

    pub fn validate(&self) -> Result<(), ImageSetError> {
        validate_images(&self.pending, self.visible_existing()).map_err(|err| self.reword(err))
    }

    /// Append candidates up to the cap.
    ///
    /// Candidates beyond the cap are dropped. A type or size violation in
    /// the truncated set leaves the set untouched. When everything kept is
    /// valid but some candidates were dropped, the truncated set is kept
    /// and the cap violation is reported.
    pub fn add_files(&mut self, candidates: Vec<PendingImage>) -> Result<(), ImageSetError> {
        let capacity = MAX_IMAGES.saturating_sub(self.visible_existing());
        let room = capacity.saturating_sub(self.pending.len());
        let offered = candidates.len();

        let mut next = self.pending.clone();
        next.extend(candidates.into_iter().take(room));
        let dropped = offered.saturating_sub(room);

        let checked = validate_images(&next, self.visible_existing()).map_err(|err| self.reword(err));
        if let Err(err) = checked {
            debug!("Rejected {} candidate image(s): {}", offered, err);
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.pending = next;
        if dropped > 0 {
            let err = self.over_cap(dropped);
            debug!("Dropped {} image(s) over the cap", dropped);
            self.error = Some(err.to_string());
            return Err(err);
        }

        self.error = None;
        Ok(())
    }

    pub fn remove_at(&mut self, index: usize) {
        if index < self.pending.len() {
            self.pending.remove(index);
        }
        self.error = None;
    }

    /// Swap the image at `index`, keeping the old one if the new file is
    /// too large or not an image.
    pub fn replace_at(&mut self, index: usize, file: PendingImage) -> Result<(), ImageSetError> {
        let result = if index >= self.pending.len() {
            Err(ImageSetError::NoSuchPosition(index))
        } else if file.size() > MAX_IMAGE_BYTES {
            Err(ImageSetError::ReplacementTooLarge)
        } else if !file.is_image() {
            Err(ImageSetError::NotAnImage {
                file_name: file.file_name.clone(),
            })
        } else {
            Ok(())
        };

        match result {
            Ok(()) => {
                self.pending[index] = file;
                self.error = None;
                Ok(())
            }
            Err(err) => {
                self.error = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub fn mark_for_deletion(&mut self, url: &str) {
        if self.existing.iter().any(|existing| existing == url) {
            self.marked_for_deletion.insert(url.to_string());
        }
    }

    pub fn restore(&mut self, url: &str) {
        self.marked_for_deletion.remove(url);
    }

    /// Forget a stored image once the gateway has deleted it.
    pub fn forget_existing(&mut self, url: &str) {
        self.existing.retain(|existing| existing != url);
        self.marked_for_deletion.remove(url);
    }

    /// Drop pending images after a successful upload.
    pub fn clear_pending(&mut self) {
        self.pending.clear();
        self.error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const MB: usize = 1024 * 1024;

    fn jpeg(name: &str, bytes: usize) -> PendingImage {
        PendingImage::new(name, "image/jpeg", vec![0; bytes])
    }

    #[test]
    fn adding_eight_images_keeps_six_and_reports_overflow() {
        let mut set = ImageSet::new();
        let candidates = (0..8).map(|i| jpeg(&format!("{i}.jpg"), MB)).collect();

        let result = set.add_files(candidates);

        assert_matches!(result, Err(ImageSetError::TooMany { dropped: 2 }));
        assert_eq!(set.pending().len(), MAX_IMAGES);
        assert_eq!(set.error(), Some("You can upload a maximum of 6 images"));
        assert_eq!(set.pending()[5].file_name, "5.jpg");
    }

    #[test]
    fn invalid_add_leaves_set_unchanged() {
        let mut set = ImageSet::new();
        set.add_files(vec![jpeg("a.jpg", 10)]).unwrap();

        let result = set.add_files(vec![PendingImage::new("notes.pdf", "application/pdf", vec![1])]);
        assert_matches!(result, Err(ImageSetError::NotAnImage { .. }));
        assert_eq!(set.pending().len(), 1);
        assert_eq!(set.error(), Some("Only image files are allowed"));

        let result = set.add_files(vec![jpeg("huge.jpg", 6 * MB)]);
        assert_matches!(result, Err(ImageSetError::TooLarge { .. }));
        assert_eq!(set.pending().len(), 1);
    }

    #[test]
    fn pending_count_never_exceeds_cap() {
        let mut set = ImageSet::new();
        for round in 0..5 {
            let _ = set.add_files((0..3).map(|i| jpeg(&format!("{round}-{i}"), 1)).collect());
            assert!(set.pending().len() <= MAX_IMAGES);
            set.remove_at(0);
            assert!(set.pending().len() <= MAX_IMAGES);
        }
    }

    #[test]
    fn remove_clears_error() {
        let mut set = ImageSet::new();
        let _ = set.add_files((0..7).map(|i| jpeg(&i.to_string(), 1)).collect());
        assert!(set.error().is_some());

        set.remove_at(2);
        assert_eq!(set.pending().len(), 5);
        assert!(set.error().is_none());

        set.remove_at(99);
        assert_eq!(set.pending().len(), 5);
    }

    #[test]
    fn oversized_replacement_keeps_prior_file() {
        let mut set = ImageSet::new();
        set.add_files(vec![jpeg("first.jpg", MB), jpeg("second.jpg", MB)])
            .unwrap();

        let result = set.replace_at(1, jpeg("big.jpg", 6 * MB));

        assert_matches!(result, Err(ImageSetError::ReplacementTooLarge));
        assert_eq!(set.pending()[1].file_name, "second.jpg");
        assert_eq!(set.error(), Some("Image should be less than 5MB"));

        set.replace_at(1, jpeg("third.png", MB)).unwrap();
        assert_eq!(set.pending()[1].file_name, "third.png");
        assert!(set.error().is_none());

        assert_matches!(
            set.replace_at(4, jpeg("x.jpg", 1)),
            Err(ImageSetError::NoSuchPosition(4))
        );
    }

    #[test]
    fn existing_images_count_towards_the_cap() {
        let existing: Vec<String> = (0..4).map(|i| format!("https://cdn.example/{i}.jpg")).collect();
        let mut set = ImageSet::with_existing(existing);

        let result = set.add_files((0..4).map(|i| jpeg(&i.to_string(), 1)).collect());
        assert_matches!(result, Err(ImageSetError::OverCapacity { dropped: 2 }));
        assert_eq!(set.error(), Some("You can have a maximum of 6 images"));
        assert_eq!(set.pending().len(), 2);
        assert_eq!(set.total(), MAX_IMAGES);

        set.mark_for_deletion("https://cdn.example/0.jpg");
        assert_eq!(set.total(), 5);
        set.add_files(vec![jpeg("extra", 1)]).unwrap();
        assert_eq!(set.total(), MAX_IMAGES);

        set.restore("https://cdn.example/0.jpg");
        assert_eq!(set.total(), 7);
        assert_matches!(set.validate(), Err(ImageSetError::OverCapacity { .. }));
    }

    #[test]
    fn deleting_every_existing_image_needs_a_replacement() {
        let mut set = ImageSet::with_existing(vec!["https://cdn.example/only.jpg".into()]);
        assert!(set.validate().is_ok());

        set.mark_for_deletion("https://cdn.example/only.jpg");
        assert_matches!(set.validate(), Err(ImageSetError::Empty));

        set.mark_for_deletion("https://cdn.example/unknown.jpg");
        assert!(!set.is_marked("https://cdn.example/unknown.jpg"));

        set.add_files(vec![jpeg("new.jpg", 1)]).unwrap();
        assert!(set.validate().is_ok());
    }

    #[test]
    fn forgetting_a_deleted_image_drops_its_mark() {
        let mut set = ImageSet::with_existing(vec!["a".into(), "b".into()]);
        set.mark_for_deletion("a");
        set.forget_existing("a");
        assert_eq!(set.existing(), ["b".to_string()]);
        assert_eq!(set.marked_for_deletion().count(), 0);
    }
}
