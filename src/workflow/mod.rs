//! Two-phase listing submission.
//!
//! Phase one persists the listing metadata and yields the listing id;
//! phase two uploads the image set against that id. The same state machine
//! drives both creating a listing and editing an existing one.

use std::fmt;

use tracing::{info, warn};

use crate::form::ListingForm;
use crate::gateway::{ownership_of, GatewayError, ListingGateway, Session};
use crate::images::{ImageSet, ImageSetError};
use crate::models::{ListingDraft, ListingId, ListingPayload};
use crate::validation::ErrorMap;

pub const FIX_ERRORS: &str = "Please fix the errors in the form";
pub const UPLOAD_FAILED: &str = "Failed to upload images";
pub const DELETE_FAILED: &str = "Failed to delete listing";
pub const DELETE_PROMPT: &str =
    "Are you sure you want to delete this listing? This action cannot be undone.";

/// Whether the workflow creates a new listing or edits a stored one
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Create,
    Edit(ListingId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Editing,
    SubmittingMetadata,
    MetadataSubmitted,
    UploadingImages,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Editing => "editing",
            Self::SubmittingMetadata => "submitting metadata",
            Self::MetadataSubmitted => "awaiting images",
            Self::UploadingImages => "uploading images",
            Self::Done => "done",
        };
        f.write_str(label)
    }
}

/// Where the UI goes once the workflow finishes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    ListingIndex,
    ListingDetail(ListingId),
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Please fix the errors in the form")]
    Invalid(ErrorMap),

    #[error("Not available while {stage}")]
    Busy { stage: Stage },

    #[error("Not available for this kind of listing workflow")]
    WrongMode,

    #[error("Listing {0} not found")]
    ListingNotFound(ListingId),

    #[error("Deleting a listing needs confirmation first")]
    DeleteNotConfirmed,

    #[error(transparent)]
    Images(#[from] ImageSetError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// One listing workflow instance, owned by a single UI
#[derive(Debug)]
pub struct ListingWorkflow<G> {
    gateway: G,
    mode: Mode,
    stage: Stage,
    form: ListingForm,
    images: ImageSet,
    listing_id: Option<ListingId>,
    submit_error: Option<String>,
    delete_requested: bool,
    deleting: bool,
    destination: Option<Destination>,
}

impl<G: ListingGateway> ListingWorkflow<G> {
    fn with_parts(gateway: G, mode: Mode, form: ListingForm, images: ImageSet) -> Self {
        Self {
            gateway,
            mode,
            stage: Stage::Editing,
            form,
            images,
            listing_id: None,
            submit_error: None,
            delete_requested: false,
            deleting: false,
            destination: None,
        }
    }

    /// Start composing a new listing owned by the session user (or anonymous).
    pub fn create(gateway: G, session: Option<&Session>) -> Self {
        let draft = ListingDraft::new(ownership_of(session));
        Self::with_parts(gateway, Mode::Create, ListingForm::new(draft), ImageSet::new())
    }

    /// Load a stored listing for editing.
    ///
    /// A missing listing is reported as [`WorkflowError::ListingNotFound`]
    /// so the caller can route away with a visible message.
    pub async fn edit(gateway: G, session: Option<&Session>, id: ListingId) -> Result<Self, WorkflowError> {
        let listing = match gateway.get_listing(&id).await {
            Ok(Some(listing)) => listing,
            Ok(None) | Err(GatewayError::NotFound) => {
                warn!("Cannot edit listing {}: not found", id);
                return Err(WorkflowError::ListingNotFound(id));
            }
            Err(err) => {
                warn!("Cannot edit listing {}: {}", id, err);
                return Err(err.into());
            }
        };

        info!("Editing listing {} via {}", id, gateway.gateway_name());
        let draft = ListingDraft::from_persisted(&listing, ownership_of(session));
        let images = ImageSet::with_existing(listing.images);
        Ok(Self::with_parts(
            gateway,
            Mode::Edit(id),
            ListingForm::new(draft),
            images,
        ))
    }

    pub fn mode(&self) -> &Mode {
        &self.mode
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn form(&self) -> &ListingForm {
        &self.form
    }

    pub fn form_mut(&mut self) -> &mut ListingForm {
        &mut self.form
    }

    pub fn images(&self) -> &ImageSet {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageSet {
        &mut self.images
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Id returned by phase one; required for every image operation.
    pub fn listing_id(&self) -> Option<&ListingId> {
        self.listing_id.as_ref()
    }

    /// Phase-level error shown above the action buttons
    pub fn submit_error(&self) -> Option<&str> {
        self.submit_error.as_deref()
    }

    pub fn destination(&self) -> Option<&Destination> {
        self.destination.as_ref()
    }

    pub fn is_submitting(&self) -> bool {
        self.stage == Stage::SubmittingMetadata
    }

    pub fn is_uploading(&self) -> bool {
        self.stage == Stage::UploadingImages
    }

    pub fn is_deleting(&self) -> bool {
        self.deleting
    }

    /// Phase one: validate the draft and persist its metadata.
    pub async fn submit(&mut self) -> Result<(), WorkflowError> {
        if self.stage != Stage::Editing {
            return Err(WorkflowError::Busy { stage: self.stage });
        }

        let mut errors = self.form.revalidate().clone();
        if matches!(self.mode, Mode::Edit(_)) {
            let image_error = self.images.validate().err().map(|e| e.to_string());
            self.form.set_image_error(image_error.clone());
            errors.set_images(image_error);
        }
        if !errors.is_empty() {
            warn!("Listing draft has {} invalid field(s)", errors.len());
            self.submit_error = Some(FIX_ERRORS.to_string());
            return Err(WorkflowError::Invalid(errors));
        }

        self.submit_error = None;
        self.delete_requested = false;
        let payload = ListingPayload::from(self.form.draft());
        self.stage = Stage::SubmittingMetadata;

        let result = match &self.mode {
            Mode::Create => self.gateway.create_listing(&payload).await,
            Mode::Edit(id) => self
                .gateway
                .update_listing(id, &payload)
                .await
                .map(|()| id.clone()),
        };

        match result {
            Ok(id) => {
                info!("Listing {} metadata saved, awaiting images", id);
                self.listing_id = Some(id);
                self.stage = Stage::MetadataSubmitted;
                Ok(())
            }
            Err(err) => {
                warn!("Saving listing metadata failed: {}", err);
                self.stage = Stage::Editing;
                self.form.merge_errors(err.field_errors());
                self.submit_error = Some(err.user_message());
                Err(err.into())
            }
        }
    }

    /// Phase two: apply deletions and upload pending images.
    pub async fn upload_images(&mut self) -> Result<Destination, WorkflowError> {
        if self.stage != Stage::MetadataSubmitted {
            return Err(WorkflowError::Busy { stage: self.stage });
        }
        let Some(id) = self.listing_id.clone() else {
            return Err(WorkflowError::Busy { stage: self.stage });
        };

        let check = if self.mode == Mode::Create && self.images.pending().is_empty() {
            Err(ImageSetError::NothingSelected)
        } else {
            self.images.validate()
        };
        if let Err(err) = check {
            self.images.set_error(Some(err.to_string()));
            return Err(err.into());
        }

        self.images.set_error(None);
        self.delete_requested = false;
        self.stage = Stage::UploadingImages;

        match self.push_images(&id).await {
            Ok(()) => {
                self.images.clear_pending();
                let destination = match self.mode {
                    Mode::Create => Destination::ListingIndex,
                    Mode::Edit(_) => Destination::ListingDetail(id.clone()),
                };
                info!("✅ Listing {} images saved", id);
                self.finish(destination.clone());
                Ok(destination)
            }
            Err(err) => {
                warn!("Image phase for listing {} failed: {}", id, err);
                self.stage = Stage::MetadataSubmitted;
                self.images.set_error(Some(err.message_or(UPLOAD_FAILED)));
                Err(err.into())
            }
        }
    }

    async fn push_images(&mut self, id: &ListingId) -> Result<(), GatewayError> {
        let marked: Vec<String> = self
            .images
            .marked_for_deletion()
            .map(str::to_string)
            .collect();
        for url in marked {
            self.gateway.delete_image(id, &url).await?;
            self.images.forget_existing(&url);
        }

        if !self.images.pending().is_empty() {
            self.gateway.upload_images(id, self.images.pending()).await?;
        }
        Ok(())
    }

    /// Leave a freshly created listing without images.
    pub fn skip_images(&mut self) -> Result<Destination, WorkflowError> {
        if self.mode != Mode::Create {
            return Err(WorkflowError::WrongMode);
        }
        if self.stage != Stage::MetadataSubmitted {
            return Err(WorkflowError::Busy { stage: self.stage });
        }
        info!("Skipping images for listing {:?}", self.listing_id);
        self.finish(Destination::ListingIndex);
        Ok(Destination::ListingIndex)
    }

    /// First half of deleting the edited listing; returns the prompt to show.
    pub fn request_delete(&mut self) -> Result<&'static str, WorkflowError> {
        if !matches!(self.mode, Mode::Edit(_)) {
            return Err(WorkflowError::WrongMode);
        }
        if matches!(
            self.stage,
            Stage::SubmittingMetadata | Stage::UploadingImages | Stage::Done
        ) {
            return Err(WorkflowError::Busy { stage: self.stage });
        }
        self.delete_requested = true;
        Ok(DELETE_PROMPT)
    }

    pub fn cancel_delete(&mut self) {
        self.delete_requested = false;
    }

    /// Delete the edited listing after [`Self::request_delete`].
    pub async fn confirm_delete(&mut self) -> Result<Destination, WorkflowError> {
        let Mode::Edit(id) = &self.mode else {
            return Err(WorkflowError::WrongMode);
        };
        if matches!(
            self.stage,
            Stage::SubmittingMetadata | Stage::UploadingImages | Stage::Done
        ) {
            self.delete_requested = false;
            return Err(WorkflowError::Busy { stage: self.stage });
        }
        if !self.delete_requested {
            return Err(WorkflowError::DeleteNotConfirmed);
        }
        if self.deleting {
            return Err(WorkflowError::Busy { stage: self.stage });
        }

        self.deleting = true;
        let result = self.gateway.delete_listing(id).await;
        self.deleting = false;
        self.delete_requested = false;

        match result {
            Ok(()) => {
                info!("🗑️ Listing deleted");
                self.finish(Destination::ListingIndex);
                Ok(Destination::ListingIndex)
            }
            Err(err) => {
                warn!("Deleting listing failed: {}", err);
                self.submit_error = Some(err.message_or(DELETE_FAILED));
                Err(err.into())
            }
        }
    }

    fn finish(&mut self, destination: Destination) {
        self.delete_requested = false;
        self.stage = Stage::Done;
        self.destination = Some(destination);
    }
}
