//! Generic list controller shared by every entity table.
//!
//! Mutations go through fetch-mutate-refetch: after a successful create or
//! update the whole collection is reloaded so server-computed fields (joined
//! customer and item names) are picked up. The refetch is part of the
//! mutation, so a failed reload reports the mutation as failed. Delete removes
//! the row locally once the backend confirms it.

use tracing::{debug, warn};

use crate::api::ResourceApi;
use crate::error::{ApiError, FailureKind};
use crate::models::{EntityId, Resource};
use crate::notify::{Notice, Notifier};

/// Result of a mutation, mirroring the notice that was emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// Rejected for insufficient stock; reported as a warning.
    Warned,
    Failed,
}

impl Outcome {
    pub fn is_applied(self) -> bool {
        self == Outcome::Applied
    }
}

#[derive(Clone, Copy)]
enum Mutation {
    Create,
    Update,
}

pub struct ResourceList<R: Resource> {
    rows: Vec<R>,
    loading: bool,
}

impl<R: Resource> Default for ResourceList<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> ResourceList<R> {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            loading: true,
        }
    }

    /// Rows in backend order.
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// True until the first load settles, successfully or not.
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Rows paired with their 1-based display index.
    pub fn indexed(&self) -> impl Iterator<Item = (usize, &R)> {
        self.rows.iter().enumerate().map(|(i, row)| (i + 1, row))
    }

    /// Fetch the full collection. On failure the previous rows stay in place
    /// and nothing is shown to the user.
    pub async fn load<A>(&mut self, api: &A) -> bool
    where
        A: ResourceApi<R> + ?Sized,
    {
        let result = api.list().await;
        self.loading = false;
        match result {
            Ok(rows) => {
                debug!(resource = R::PATH, count = rows.len(), "collection loaded");
                self.rows = rows;
                true
            }
            Err(e) => {
                warn!(resource = R::PATH, error = %e, "failed to load collection");
                false
            }
        }
    }

    pub async fn create<A>(&mut self, api: &A, draft: &R::Draft, notifier: &dyn Notifier) -> Outcome
    where
        A: ResourceApi<R> + ?Sized,
    {
        match api.create(draft).await {
            Ok(_) => self.refetch(api, Mutation::Create, notifier).await,
            Err(e) => self.report_failure(Mutation::Create, &e, notifier),
        }
    }

    pub async fn update<A>(
        &mut self,
        api: &A,
        id: &EntityId,
        draft: &R::Draft,
        notifier: &dyn Notifier,
    ) -> Outcome
    where
        A: ResourceApi<R> + ?Sized,
    {
        debug!(resource = R::PATH, id = %id, "updating record");
        match api.update(id, draft).await {
            Ok(_) => self.refetch(api, Mutation::Update, notifier).await,
            Err(e) => self.report_failure(Mutation::Update, &e, notifier),
        }
    }

    async fn refetch<A>(&mut self, api: &A, mutation: Mutation, notifier: &dyn Notifier) -> Outcome
    where
        A: ResourceApi<R> + ?Sized,
    {
        let messages = R::MESSAGES;
        let (done, failed) = match mutation {
            Mutation::Create => (messages.created, messages.create_failed),
            Mutation::Update => (messages.updated, messages.update_failed),
        };
        if self.load(api).await {
            notifier.notify(Notice::success(done));
            Outcome::Applied
        } else {
            notifier.notify(Notice::error(failed));
            Outcome::Failed
        }
    }

    /// The row disappears only after the backend confirms the delete.
    pub async fn delete<A>(&mut self, api: &A, id: &EntityId, notifier: &dyn Notifier) -> Outcome
    where
        A: ResourceApi<R> + ?Sized,
    {
        match api.delete(id).await {
            Ok(()) => {
                self.rows.retain(|row| row.id() != id);
                notifier.notify(Notice::success(R::MESSAGES.deleted));
                Outcome::Applied
            }
            Err(e) => {
                warn!(resource = R::PATH, id = %id, error = %e, "delete failed");
                notifier.notify(
                    Notice::error(R::MESSAGES.delete_failed).with_description(e.message()),
                );
                Outcome::Failed
            }
        }
    }

    fn report_failure(&self, mutation: Mutation, err: &ApiError, notifier: &dyn Notifier) -> Outcome {
        let messages = R::MESSAGES;
        let (failed, insufficient, log) = match mutation {
            Mutation::Create => (messages.create_failed, messages.insufficient_on_create, true),
            Mutation::Update => (
                messages.update_failed,
                messages.insufficient_on_update,
                messages.log_update_failures,
            ),
        };

        if log {
            warn!(resource = R::PATH, error = %err, "mutation failed");
        }

        match insufficient {
            Some(warning) if err.failure_kind() == FailureKind::InsufficientStock => {
                notifier.notify(Notice::warning(warning));
                Outcome::Warned
            }
            _ => {
                notifier.notify(Notice::error(failed).with_description(err.message()));
                Outcome::Failed
            }
        }
    }
}
