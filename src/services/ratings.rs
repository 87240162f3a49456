//! Per-post rating aggregation.
//!
//! Every submission reads the post's aggregate, adds the new value and writes
//! the whole document back. How the write is performed depends on
//! [`RatingConsistency`]:
//!
//! * `BestEffort` upserts unconditionally. Two submissions that read the same
//!   aggregate both write `count + 1` and one of them is lost.
//! * `Optimistic` creates the document only if it is still absent, or replaces
//!   it only if its etag is unchanged, and starts over on conflict.

use crate::{
    config::RatingConsistency,
    error::AppError,
    models::rating::{RatingAggregate, is_valid_rating},
    store::{Container, ContainerName, DocumentClient, QuerySpec, StoreError, Stored},
};

/// Upper bound on read-modify-write rounds in optimistic mode.
pub const MAX_RATING_ATTEMPTS: usize = 8;

const SUBMIT_FAILED: &str = "Failed to submit rating";

/// Result of looking up a post's aggregate.
#[derive(Debug, Clone, PartialEq)]
pub enum AggregateLookup {
    Absent,
    Present(Stored<RatingAggregate>),
}

impl AggregateLookup {
    /// The aggregate to increment: the stored one, or an empty one for `post_id`.
    pub fn base(&self, post_id: &str) -> RatingAggregate {
        match self {
            AggregateLookup::Absent => RatingAggregate::empty(post_id),
            AggregateLookup::Present(stored) => stored.value.clone(),
        }
    }
}

#[derive(Clone)]
pub struct RatingService {
    ratings: Container,
    consistency: RatingConsistency,
}

impl RatingService {
    pub fn new(client: &DocumentClient, consistency: RatingConsistency) -> Self {
        Self {
            ratings: client.container(ContainerName::Ratings),
            consistency,
        }
    }

    pub fn consistency(&self) -> RatingConsistency {
        self.consistency
    }

    /// Records one rating for `post_id` and returns the updated aggregate.
    pub async fn submit_rating(&self, post_id: &str, value: f64) -> Result<RatingAggregate, AppError> {
        if !is_valid_rating(value) {
            return Err(AppError::InvalidArgument(
                "rating must be a number 1-5".to_string(),
            ));
        }

        match self.consistency {
            RatingConsistency::BestEffort => self.submit_best_effort(post_id, value).await,
            RatingConsistency::Optimistic => self.submit_optimistic(post_id, value).await,
        }
    }

    /// Fetches the aggregate for `post_id` by exact match on the partition key.
    pub async fn fetch_aggregate(&self, post_id: &str) -> Result<AggregateLookup, StoreError> {
        let spec = QuerySpec::new().filter_eq("postId", post_id);
        let mut found = self.ratings.query::<RatingAggregate>(&spec).await?;

        if found.len() > 1 {
            tracing::warn!(
                post_id,
                count = found.len(),
                "Multiple rating aggregates found, using the first"
            );
        }

        Ok(if found.is_empty() {
            AggregateLookup::Absent
        } else {
            AggregateLookup::Present(found.swap_remove(0))
        })
    }

    async fn submit_best_effort(&self, post_id: &str, value: f64) -> Result<RatingAggregate, AppError> {
        let lookup = self
            .fetch_aggregate(post_id)
            .await
            .map_err(|e| AppError::upstream(SUBMIT_FAILED, e))?;

        let updated = lookup.base(post_id).record(value);

        let stored = self
            .ratings
            .upsert(&updated)
            .await
            .map_err(|e| AppError::upstream(SUBMIT_FAILED, e))?;

        Ok(stored.value)
    }

    async fn submit_optimistic(&self, post_id: &str, value: f64) -> Result<RatingAggregate, AppError> {
        for attempt in 1..=MAX_RATING_ATTEMPTS {
            let lookup = self
                .fetch_aggregate(post_id)
                .await
                .map_err(|e| AppError::upstream(SUBMIT_FAILED, e))?;

            let updated = lookup.base(post_id).record(value);

            let written = match &lookup {
                AggregateLookup::Absent => self.ratings.create(&updated).await,
                AggregateLookup::Present(stored) => {
                    self.ratings.replace_if_match(&updated, &stored.etag).await
                }
            };

            match written {
                Ok(stored) => return Ok(stored.value),
                // Someone else wrote the aggregate between our read and write.
                Err(
                    StoreError::Conflict { .. }
                    | StoreError::PreconditionFailed { .. }
                    | StoreError::NotFound { .. },
                ) => {
                    tracing::debug!(post_id, attempt, "Rating aggregate changed concurrently, retrying");
                }
                Err(e) => return Err(AppError::upstream(SUBMIT_FAILED, e)),
            }
        }

        tracing::warn!(post_id, "Gave up updating rating aggregate under contention");
        Err(AppError::Upstream {
            message: SUBMIT_FAILED.to_string(),
            details: Some(format!(
                "aggregate for post '{}' kept changing after {} attempts",
                post_id, MAX_RATING_ATTEMPTS
            )),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryDocumentStore;

    fn service(consistency: RatingConsistency) -> RatingService {
        let client = DocumentClient::new(Arc::new(MemoryDocumentStore::new()));
        RatingService::new(&client, consistency)
    }

    #[tokio::test]
    async fn sequential_ratings_accumulate_in_both_modes() {
        for mode in [RatingConsistency::BestEffort, RatingConsistency::Optimistic] {
            let ratings = service(mode);
            let values = [5.0, 3.0, 4.0, 1.0, 2.5];

            let mut last = None;
            for v in values {
                last = Some(ratings.submit_rating("p1", v).await.unwrap());
            }
            let agg = last.unwrap();

            assert_eq!(agg.count, values.len() as u64);
            assert_eq!(agg.sum, values.iter().sum::<f64>());
            assert_eq!(agg.avg, 3.1);
            assert_eq!(agg.id, "p1");
        }
    }

    #[tokio::test]
    async fn invalid_rating_does_not_touch_the_aggregate() {
        let ratings = service(RatingConsistency::Optimistic);
        ratings.submit_rating("p1", 4.0).await.unwrap();

        for bad in [0.0, 6.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = ratings.submit_rating("p1", bad).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidArgument(_)));
        }

        match ratings.fetch_aggregate("p1").await.unwrap() {
            AggregateLookup::Present(stored) => {
                assert_eq!(stored.value.count, 1);
                assert_eq!(stored.value.sum, 4.0);
            }
            AggregateLookup::Absent => panic!("aggregate should exist"),
        }
    }

    #[tokio::test]
    async fn aggregates_are_scoped_per_post() {
        let ratings = service(RatingConsistency::BestEffort);
        ratings.submit_rating("a", 5.0).await.unwrap();
        ratings.submit_rating("b", 1.0).await.unwrap();
        let a = ratings.submit_rating("a", 3.0).await.unwrap();

        assert_eq!((a.count, a.sum, a.avg), (2, 8.0, 4.0));
        assert_eq!(ratings.fetch_aggregate("missing").await.unwrap(), AggregateLookup::Absent);
    }
}
