//! Location, offers and doctors replies built from the clinic catalog

use crate::catalog::Catalog;
use crate::intent::Language;
use crate::replies;
use crate::runtime::{Dispatcher, MediaService};
use crate::whatsapp::{DispatchError, OutboundMessage};
use async_trait::async_trait;
use std::sync::Arc;

/// Media replies sent through a [`Dispatcher`]
pub struct CatalogMedia<D: Dispatcher> {
    catalog: Arc<Catalog>,
    dispatcher: D,
}

impl<D: Dispatcher> CatalogMedia<D> {
    pub fn new(catalog: Arc<Catalog>, dispatcher: D) -> Self {
        Self {
            catalog,
            dispatcher,
        }
    }

    /// Send each picture; a rejected picture is retried as a text link
    async fn send_gallery(
        &self,
        to: &str,
        links: &[String],
        caption: &str,
        lang: Language,
    ) -> Result<(), DispatchError> {
        if links.is_empty() {
            return self
                .dispatcher
                .send(&OutboundMessage::text(to, replies::media_unavailable(lang)))
                .await;
        }
        for link in links {
            let image = OutboundMessage::image(to, link, caption);
            if let Err(e) = self.dispatcher.send(&image).await {
                tracing::warn!(to = %to, link = %link, error = %e, "Image rejected, sending link");
                let fallback = format!("{caption}\n{link}");
                self.dispatcher
                    .send(&OutboundMessage::text(to, &fallback))
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<D: Dispatcher> MediaService for CatalogMedia<D> {
    async fn send_location(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        let body = self.catalog.location_text(lang);
        self.dispatcher
            .send(&OutboundMessage::text(to, &body))
            .await
    }

    async fn send_offers_validity(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        let body = self.catalog.offers_validity(lang);
        self.dispatcher.send(&OutboundMessage::text(to, body)).await
    }

    async fn send_offers_images(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        self.send_gallery(
            to,
            &self.catalog.offers.images,
            replies::offers_caption(lang),
            lang,
        )
        .await
    }

    async fn send_doctors(&self, to: &str, lang: Language) -> Result<(), DispatchError> {
        self.send_gallery(
            to,
            &self.catalog.doctors,
            replies::doctors_caption(lang),
            lang,
        )
        .await
    }
}
