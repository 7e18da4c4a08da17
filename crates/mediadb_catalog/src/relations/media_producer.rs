//! Media–producer credits.

use crate::impl_model;
use crate::media::{Media, MediaService};
use crate::producer::{Producer, ProducerService};
use mediadb_core::{
    EngineResult, EntityId, Metadata, Model, PersistHooks, Repository, Service, Tx,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Credits a producer (studio, publisher, licensor) on a media record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MediaProducer {
    /// Engine-managed metadata.
    #[serde(flatten)]
    pub meta: Metadata,
    /// The credited media record.
    pub media_id: EntityId,
    /// The credited producer.
    pub producer_id: EntityId,
}

impl_model!(MediaProducer);

/// Service descriptor for [`MediaProducer`].
pub struct MediaProducerService {
    media: Repository<MediaService>,
    producers: Repository<ProducerService>,
    hooks: PersistHooks<MediaProducer>,
}

impl MediaProducerService {
    /// Bucket holding media-producer records.
    pub const BUCKET: &'static str = "media_producers";

    /// Creates the service and registers cascades on both sides.
    pub fn new(
        media: Repository<MediaService>,
        producers: Repository<ProducerService>,
    ) -> Arc<Self> {
        let service = Arc::new(Self {
            media: media.clone(),
            producers: producers.clone(),
            hooks: PersistHooks::new(),
        });

        let weak = Arc::downgrade(&service);
        media
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, media: &Media| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_media(tx, media.meta().id)?;
                }
                Ok(())
            }));

        let weak = Arc::downgrade(&service);
        producers
            .service()
            .hooks()
            .on_pre_delete(Box::new(move |tx, producer: &Producer| {
                if let Some(svc) = weak.upgrade() {
                    Repository::new(svc).delete_by_producer(tx, producer.meta().id)?;
                }
                Ok(())
            }));

        service
    }
}

impl Service for MediaProducerService {
    type Entity = MediaProducer;

    fn bucket(&self) -> &'static str {
        Self::BUCKET
    }

    fn validate(&self, tx: &Tx<'_>, entity: &MediaProducer) -> EngineResult<()> {
        self.media.ensure_exists(tx, entity.media_id)?;
        self.producers.ensure_exists(tx, entity.producer_id)?;
        Ok(())
    }

    fn hooks(&self) -> &PersistHooks<MediaProducer> {
        &self.hooks
    }
}

/// Query helpers on the media-producer repository.
pub trait MediaProducerQueries {
    /// Returns the producer credits of one media record.
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaProducer>>;

    /// Returns the credits of one producer.
    fn get_by_producer(
        &self,
        tx: &Tx<'_>,
        producer_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaProducer>>;

    /// Purges the credits of one media record.
    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize>;

    /// Purges all credits referencing one producer.
    fn delete_by_producer(&self, tx: &Tx<'_>, producer_id: EntityId) -> EngineResult<usize>;
}

impl MediaProducerQueries for Repository<MediaProducerService> {
    fn get_by_media(
        &self,
        tx: &Tx<'_>,
        media_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaProducer>> {
        self.get_filter(tx, first, skip, |r| r.media_id == media_id)
    }

    fn get_by_producer(
        &self,
        tx: &Tx<'_>,
        producer_id: EntityId,
        first: Option<i64>,
        skip: Option<i64>,
    ) -> EngineResult<Vec<MediaProducer>> {
        self.get_filter(tx, first, skip, |r| r.producer_id == producer_id)
    }

    fn delete_by_media(&self, tx: &Tx<'_>, media_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.media_id == media_id)
    }

    fn delete_by_producer(&self, tx: &Tx<'_>, producer_id: EntityId) -> EngineResult<usize> {
        self.delete_filter(tx, |r| r.producer_id == producer_id)
    }
}
