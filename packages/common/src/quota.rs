//! Upload admission.
//!
//! Decides how many files of an incoming batch may be kept given two
//! ceilings: how many files one uploader may own, and how many files of a
//! kind the whole gallery may hold. Counts are read by the caller right
//! before admission; nothing here is cached.

/// Counts and ceilings observed at admission time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QuotaSnapshot {
    pub uploader_count: u64,
    pub uploader_limit: u64,
    pub global_count: u64,
    pub global_limit: u64,
}

impl QuotaSnapshot {
    /// Slots left for this uploader; zero once the count reaches the limit.
    pub fn remaining_for_uploader(&self) -> u64 {
        self.uploader_limit.saturating_sub(self.uploader_count)
    }

    /// Slots left in the gallery; zero once the count reaches the limit.
    pub fn remaining_global(&self) -> u64 {
        self.global_limit.saturating_sub(self.global_count)
    }

    pub fn allowed_now(&self) -> u64 {
        self.remaining_for_uploader().min(self.remaining_global())
    }
}

/// Why a whole batch was turned away.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QuotaRejection {
    /// The global ceiling is exhausted. Retrying later will not help.
    GalleryFull,
    /// This uploader already owns `limit` files of the kind.
    PerPersonLimit { limit: u64 },
}

/// Outcome of admitting a batch.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Admission {
    Rejected(QuotaRejection),
    /// The first `accepted` files are kept, the trailing `skipped` are dropped.
    Accepted { accepted: usize, skipped: usize },
}

/// Admit up to `batch_size` files against `snapshot`.
///
/// A batch larger than the remaining room is truncated, not bounced. The
/// gallery-full reason wins over the per-person reason when both apply.
pub fn admit(snapshot: QuotaSnapshot, batch_size: usize) -> Admission {
    let allowed = snapshot.allowed_now();

    if allowed == 0 {
        let reason = if snapshot.remaining_global() == 0 {
            QuotaRejection::GalleryFull
        } else {
            QuotaRejection::PerPersonLimit {
                limit: snapshot.uploader_limit,
            }
        };
        return Admission::Rejected(reason);
    }

    let accepted = usize::try_from(allowed).unwrap_or(usize::MAX).min(batch_size);
    Admission::Accepted {
        accepted,
        skipped: batch_size - accepted,
    }
}

/// Split `items` into the first `accepted` entries and the rest, keeping
/// submission order in both halves.
pub fn partition<T>(mut items: Vec<T>, accepted: usize) -> (Vec<T>, Vec<T>) {
    let at = accepted.min(items.len());
    let rest = items.split_off(at);
    (items, rest)
}
