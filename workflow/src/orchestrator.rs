//! Product creation workflow.
//!
//! [`WorkflowOrchestrator`] owns one draft and runs the creation steps
//! against a [`MarketplaceBackend`]: image upload, quick text, story and
//! marketing generation, and the final save.
//!
//! # Failure policy
//!
//! - Validation failures block the step before any network call.
//! - Network failures in upload and generation degrade only that stage:
//!   earlier text is kept, a marker is appended, and the step returns
//!   [`StageOutcome::Degraded`] with the reason also surfaced through
//!   [`WorkflowOrchestrator::last_error`] and, with the stage attached,
//!   [`WorkflowOrchestrator::last_failure`].
//! - `Err` is reserved for `Busy`, `Closed`, `Validation`, `Cancelled` and
//!   save failures.
//!
//! # Example
//!
//! ```no_run
//! use artisan_studio_core::environment::SystemClock;
//! use artisan_studio_http::RequestClient;
//! use artisan_studio_workflow::{HttpMarketplace, WorkflowConfig, WorkflowOrchestrator};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = Arc::new(HttpMarketplace::new(RequestClient::from_env()?));
//! let workflow = WorkflowOrchestrator::new(backend, Arc::new(SystemClock), &WorkflowConfig::default());
//!
//! workflow.update_draft(|draft| {
//!     draft.title = "Blue Pottery Vase".to_string();
//!     draft.category = "Pottery".to_string();
//! })?;
//! workflow.generate_story().await?;
//! let saved = workflow.save(|summary| println!("created {}", summary.id)).await?;
//! # let _ = saved;
//! # Ok(())
//! # }
//! ```

use crate::backend::{
    GenerateRequest, MarketplaceBackend, PostOptions, QuickTextMode, QuickTextRequest,
    SuggestRequest, TaglineRequest,
};
use crate::config::WorkflowConfig;
use crate::error::WorkflowError;
use crate::session::{SessionState, StageTicket, WorkflowSession};
use crate::upload::LocalFile;
use artisan_studio_core::compose::{append_line, description_line, quick_history};
use artisan_studio_core::environment::Clock;
use artisan_studio_core::{
    GenerationStage, ProductDraft, ProductPayload, ProductSummary, StageKind, StreamEvent,
};
use artisan_studio_http::ApiError;
use futures::StreamExt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Result of a step that did not fail fatally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StageOutcome {
    /// The stage finished normally
    Completed,
    /// The stage failed; the session stays usable
    Degraded {
        /// Failure reason
        reason: String,
    },
}

impl StageOutcome {
    /// Whether the stage finished normally
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

/// Marketing copy gathered for the draft.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarketingCopy {
    /// Post text
    pub text: String,
    /// Hashtags, without `#`
    pub hashtags: Vec<String>,
    /// Suggested posting time
    pub best_time: Option<String>,
    /// Generated images
    pub images: Vec<String>,
}

#[derive(Debug)]
struct SessionData {
    draft: ProductDraft,
    marketing: MarketingCopy,
    last_error: Option<String>,
    channel: String,
    lang: String,
    tone: String,
}

/// Drives one product creation session.
pub struct WorkflowOrchestrator {
    backend: Arc<dyn MarketplaceBackend>,
    clock: Arc<dyn Clock>,
    currency: String,
    session: WorkflowSession,
    data: Mutex<SessionData>,
}

impl WorkflowOrchestrator {
    /// Start a session with an empty draft
    #[must_use]
    pub fn new(
        backend: Arc<dyn MarketplaceBackend>,
        clock: Arc<dyn Clock>,
        config: &WorkflowConfig,
    ) -> Self {
        Self {
            backend,
            clock,
            currency: config.currency.clone(),
            session: WorkflowSession::new(),
            data: Mutex::new(SessionData {
                draft: new_draft(&config.currency),
                marketing: MarketingCopy::default(),
                last_error: None,
                channel: config.channel.clone(),
                lang: config.lang.clone(),
                tone: config.tone.clone(),
            }),
        }
    }

    fn data(&self) -> MutexGuard<'_, SessionData> {
        self.data.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the draft
    #[must_use]
    pub fn draft(&self) -> ProductDraft {
        self.data().draft.clone()
    }

    /// Edit the draft.
    ///
    /// # Errors
    ///
    /// Returns `WorkflowError::Closed` after save or abandonment
    pub fn update_draft<F>(&self, edit: F) -> Result<(), WorkflowError>
    where
        F: FnOnce(&mut ProductDraft),
    {
        if self.session.is_closed() {
            return Err(WorkflowError::Closed);
        }
        edit(&mut self.data().draft);
        Ok(())
    }

    /// Snapshot of the marketing copy
    #[must_use]
    pub fn marketing(&self) -> MarketingCopy {
        self.data().marketing.clone()
    }

    /// Error surfaced by the last step, if any
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.data().last_error.clone()
    }

    /// Tone for generated text
    pub fn set_tone(&self, tone: impl Into<String>) {
        self.data().tone = tone.into();
    }

    /// Language for generated text
    pub fn set_lang(&self, lang: impl Into<String>) {
        self.data().lang = lang.into();
    }

    /// Session state
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Whether a step may start now
    #[must_use]
    pub fn can_start(&self) -> bool {
        self.session.can_start()
    }

    /// The failure that left the session degraded, if it still is.
    ///
    /// Cleared as soon as another stage starts.
    #[must_use]
    pub fn last_failure(&self) -> Option<WorkflowError> {
        match self.session.state() {
            SessionState::Degraded { stage, reason } => {
                Some(WorkflowError::StageDegraded { stage, reason })
            }
            _ => None,
        }
    }

    /// Status of one stage
    #[must_use]
    pub fn stage(&self, kind: StageKind) -> GenerationStage {
        self.session.stage(kind)
    }

    /// Upload an image and attach it to the draft.
    ///
    /// Obtains a signed destination, `PUT`s the bytes when the server hands
    /// out an upload URL, and appends the public URL. If either phase fails
    /// the image is attached inline as a `data:` reference instead.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `Closed` or `Cancelled`
    pub async fn upload_image(&self, file: LocalFile) -> Result<StageOutcome, WorkflowError> {
        let ticket = self.start(StageKind::Upload)?;
        let content_type = file.content_type_or_default().to_string();

        let uploaded = guarded(&ticket, async {
            let signed = self
                .backend
                .signed_upload(file.name.clone(), content_type.clone())
                .await?;
            if let Some(url) = signed.upload_url.filter(|u| !u.trim().is_empty()) {
                self.backend
                    .put_object(
                        url,
                        file.bytes.clone(),
                        content_type.clone(),
                        ticket.token().clone(),
                    )
                    .await?;
            }
            Ok::<_, ApiError>(signed.public_url)
        })
        .await;

        match uploaded {
            Ok(public_url) => {
                self.data().draft.add_image(public_url);
                Ok(self.complete(ticket, "uploaded"))
            }
            Err(WorkflowError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(err) => {
                self.data().draft.add_image(file.to_data_url());
                Ok(self.degrade(ticket, &err))
            }
        }
    }

    /// Ask the server for a description and story from the fields so far.
    ///
    /// Only non-empty returned fields are applied; a failure leaves the
    /// draft untouched.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `Closed` or `Cancelled`
    pub async fn generate_quick_text(&self) -> Result<StageOutcome, WorkflowError> {
        let ticket = self.start(StageKind::Description)?;
        let (id, payload) = self.payload();

        let request = QuickTextRequest {
            patch: payload,
            mode: QuickTextMode::Both,
            persist: false,
        };
        match guarded(&ticket, self.backend.quick_text(id, request)).await {
            Ok(text) => {
                let mut data = self.data();
                if let Some(description) = text.description.filter(|d| !d.trim().is_empty()) {
                    data.draft.description = description;
                }
                if let Some(story) = text.story.filter(|s| !s.trim().is_empty()) {
                    data.draft.story = story;
                }
                drop(data);
                Ok(self.complete(ticket, "quick text applied"))
            }
            Err(WorkflowError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(err) => Ok(self.degrade(ticket, &err)),
        }
    }

    /// Append the one-line description template. No network call.
    ///
    /// # Errors
    ///
    /// Returns `Busy` or `Closed`
    pub fn append_local_description(&self) -> Result<StageOutcome, WorkflowError> {
        let ticket = self.start(StageKind::Description)?;
        {
            let mut data = self.data();
            let line = description_line(&data.draft);
            data.draft.description = append_line(&data.draft.description, &line);
        }
        Ok(self.complete(ticket, "template appended"))
    }

    /// Short provenance paragraph composed offline from the draft.
    #[must_use]
    pub fn compose_quick_history(&self) -> String {
        quick_history(&self.data().draft)
    }

    /// Persist the draft and generate its story.
    ///
    /// On failure `"[Story failed] <reason>"` is appended to the existing
    /// story on a new line.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `Closed` or `Cancelled`
    pub async fn generate_story(&self) -> Result<StageOutcome, WorkflowError> {
        let ticket = self.start(StageKind::Story)?;
        let (id, payload) = self.payload();
        let request = {
            let data = self.data();
            GenerateRequest {
                langs: vec![data.lang.clone()],
                tone: data.tone.clone(),
            }
        };

        let generated = guarded(&ticket, async {
            self.backend.upsert_product(payload).await?;
            self.backend.generate(id, request).await
        })
        .await;

        match generated {
            Ok(response) => {
                self.data().draft.story = response.story_text();
                Ok(self.complete(ticket, "story generated"))
            }
            Err(WorkflowError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(err) => {
                self.mark_failed(StageKind::Story, &err);
                Ok(self.degrade(ticket, &err))
            }
        }
    }

    /// Persist the draft, fetch suggestions and compose a marketing post.
    ///
    /// On failure `"[Marketing failed] <reason>"` is appended to the existing
    /// post text on a new line.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `Closed` or `Cancelled`
    pub async fn generate_marketing_post(&self) -> Result<StageOutcome, WorkflowError> {
        let ticket = self.start(StageKind::MarketingPost)?;
        let (id, payload) = self.payload();
        let (suggest, options) = {
            let data = self.data();
            (
                SuggestRequest {
                    product_id: id.clone(),
                    channel: data.channel.clone(),
                    lang: data.lang.clone(),
                },
                PostOptions {
                    channel: data.channel.clone(),
                    lang: data.lang.clone(),
                    tone: data.tone.clone(),
                },
            )
        };

        let composed = guarded(&ticket, async {
            self.backend.upsert_product(payload).await?;
            let suggestion = self.backend.suggest(suggest).await?;
            let hashtags = suggestion.normalized_hashtags();
            let post = self
                .backend
                .create_post(id, options, Some(hashtags.clone()))
                .await?;
            Ok::<_, ApiError>((suggestion, hashtags, post))
        })
        .await;

        match composed {
            Ok((suggestion, hashtags, post)) => {
                let item = post.post_item();
                let mut data = self.data();
                data.marketing.text = item.post_text();
                data.marketing.hashtags = hashtags;
                data.marketing.best_time = suggestion.best_time;
                data.marketing.images = item.image_uri.into_iter().collect();
                drop(data);
                Ok(self.complete(ticket, "post composed"))
            }
            Err(WorkflowError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(err) => {
                self.mark_failed(StageKind::MarketingPost, &err);
                Ok(self.degrade(ticket, &err))
            }
        }
    }

    /// Stream marketing copy into the post text.
    ///
    /// Deltas are appended inline, complete segments on a new line. A
    /// transport failure appends the marketing failure marker.
    ///
    /// # Errors
    ///
    /// Returns `Busy`, `Closed` or `Cancelled`
    pub async fn stream_marketing_copy(&self) -> Result<StageOutcome, WorkflowError> {
        let ticket = self.start(StageKind::MarketingPost)?;
        let (id, _) = self.payload();
        let request = {
            let data = self.data();
            TaglineRequest {
                product_id: id,
                channel: data.channel.clone(),
                lang: data.lang.clone(),
                tone: data.tone.clone(),
            }
        };

        let mut events = match guarded(
            &ticket,
            self.backend.stream_taglines(request, ticket.token().clone()),
        )
        .await {
            Ok(events) => events,
            Err(WorkflowError::Cancelled) => return Err(WorkflowError::Cancelled),
            Err(err) => {
                self.mark_failed(StageKind::MarketingPost, &err);
                return Ok(self.degrade(ticket, &err));
            }
        };

        loop {
            let next = tokio::select! {
                biased;
                () = ticket.token().cancelled() => return Err(WorkflowError::Cancelled),
                next = events.next() => next,
            };

            match next {
                Some(Ok(StreamEvent::Delta(delta))) => self.data().marketing.text.push_str(&delta),
                Some(Ok(StreamEvent::Text(text))) => {
                    let mut data = self.data();
                    data.marketing.text = append_line(&data.marketing.text, &text);
                }
                Some(Ok(StreamEvent::Structured(value))) => {
                    tracing::debug!(%value, "ignoring structured stream record");
                }
                Some(Err(err)) => {
                    let err = WorkflowError::from(err);
                    self.mark_failed(StageKind::MarketingPost, &err);
                    return Ok(self.degrade(ticket, &err));
                }
                None => break,
            }
        }

        Ok(self.complete(ticket, "copy streamed"))
    }

    /// Validate, persist and close the session.
    ///
    /// `on_created` receives the catalog row of the saved product before
    /// the session closes.
    ///
    /// # Errors
    ///
    /// - `Validation` if the title or category is missing (no network call)
    /// - `Busy`, `Closed` or `Cancelled`
    /// - `Api` if the backend rejected the save
    pub async fn save<F>(&self, on_created: F) -> Result<ProductSummary, WorkflowError>
    where
        F: FnOnce(ProductSummary),
    {
        if self.session.is_closed() {
            return Err(WorkflowError::Closed);
        }
        let validation = self.data().draft.validate();
        if let Err(err) = validation {
            let err = WorkflowError::from(err);
            self.data().last_error = Some(err.to_string());
            return Err(err);
        }

        let ticket = self.start(StageKind::Save)?;
        let (id, payload) = self.payload();

        match guarded(&ticket, self.backend.upsert_product(payload)).await {
            Ok(()) => {
                let summary = self.data().draft.summary(&id);
                on_created(summary.clone());
                tracing::info!(product_id = %id, "product saved");
                ticket.succeed("saved");
                self.session.close();
                Ok(summary)
            }
            Err(WorkflowError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(err) => {
                let reason = err.to_string();
                tracing::warn!(product_id = %id, error = %reason, "save failed");
                self.data().last_error = Some(reason.clone());
                ticket.fail(reason);
                Err(err)
            }
        }
    }

    /// Cancel anything in flight, discard the draft and close the session.
    pub fn abandon(&self) {
        self.session.close();
        let mut data = self.data();
        data.draft = new_draft(&self.currency);
        data.marketing = MarketingCopy::default();
        data.last_error = None;
        tracing::info!("creation session abandoned");
    }

    fn start(&self, kind: StageKind) -> Result<StageTicket<'_>, WorkflowError> {
        let ticket = self.session.begin(kind)?;
        self.data().last_error = None;
        Ok(ticket)
    }

    /// Fix the draft id and build the payload for it.
    fn payload(&self) -> (String, ProductPayload) {
        let mut data = self.data();
        let id = data.draft.ensure_id(self.clock.as_ref()).to_string();
        let payload = data.draft.to_payload(&id);
        (id, payload)
    }

    fn mark_failed(&self, kind: StageKind, err: &WorkflowError) {
        let Some(marker) = kind.failure_marker() else {
            return;
        };
        let line = format!("{marker} {err}");
        let mut data = self.data();
        match kind {
            StageKind::Story => data.draft.story = append_line(&data.draft.story, &line),
            StageKind::MarketingPost => {
                data.marketing.text = append_line(&data.marketing.text, &line);
            }
            StageKind::Upload | StageKind::Description | StageKind::Save => {}
        }
    }

    fn complete(&self, ticket: StageTicket<'_>, note: &str) -> StageOutcome {
        let kind = ticket.kind();
        ticket.succeed(note);
        tracing::info!(stage = %kind, product_id = ?self.data().draft.id, "stage completed");
        StageOutcome::Completed
    }

    fn degrade(&self, ticket: StageTicket<'_>, err: &WorkflowError) -> StageOutcome {
        let reason = err.to_string();
        tracing::warn!(stage = %ticket.kind(), error = %reason, "stage degraded");
        self.data().last_error = Some(reason.clone());
        ticket.fail(reason.clone());
        StageOutcome::Degraded { reason }
    }
}

fn new_draft(currency: &str) -> ProductDraft {
    ProductDraft {
        currency: currency.to_string(),
        ..ProductDraft::new()
    }
}

/// Run a backend call unless the stage is cancelled first.
async fn guarded<T, F>(ticket: &StageTicket<'_>, fut: F) -> Result<T, WorkflowError>
where
    F: Future<Output = Result<T, ApiError>>,
{
    tokio::select! {
        biased;
        () = ticket.token().cancelled() => Err(WorkflowError::Cancelled),
        out = fut => out.map_err(|err| {
            if err.is_cancelled() {
                WorkflowError::Cancelled
            } else {
                WorkflowError::Api(err)
            }
        }),
    }
}
