use crate::domain::site::{AboutPage, ConsultationButton, GtmConfig};
use crate::error::RepositoryResult;
use crate::events::Topic;
use crate::repository::{SiteSettingsReader, SiteSettingsWriter, StoreRepository};
use crate::storage::KeyValueStore;
use crate::storage::keys::{ABOUT_KEY, CONSULTATION_KEY, GTM_KEY};

impl<S: KeyValueStore> SiteSettingsReader for StoreRepository<S> {
    fn get_about(&self) -> RepositoryResult<AboutPage> {
        self.adapter.read_document(ABOUT_KEY, AboutPage::default)
    }

    fn get_gtm_config(&self) -> RepositoryResult<GtmConfig> {
        self.adapter.read_document(GTM_KEY, GtmConfig::default)
    }

    fn get_consultation_button(&self) -> RepositoryResult<ConsultationButton> {
        self.adapter
            .read_document(CONSULTATION_KEY, ConsultationButton::default)
    }
}

impl<S: KeyValueStore> SiteSettingsWriter for StoreRepository<S> {
    fn save_about(&self, about: &AboutPage) -> RepositoryResult<()> {
        self.adapter.save_document(ABOUT_KEY, Topic::About, about)
    }

    fn reset_about(&self) -> RepositoryResult<AboutPage> {
        let about = AboutPage::default();
        self.save_about(&about)?;
        Ok(about)
    }

    fn save_gtm_config(&self, gtm: &GtmConfig) -> RepositoryResult<()> {
        self.adapter.save_document(GTM_KEY, Topic::Gtm, gtm)
    }

    fn reset_gtm_config(&self) -> RepositoryResult<GtmConfig> {
        let gtm = GtmConfig::default();
        self.save_gtm_config(&gtm)?;
        Ok(gtm)
    }

    fn save_consultation_button(&self, button: &ConsultationButton) -> RepositoryResult<()> {
        self.adapter
            .save_document(CONSULTATION_KEY, Topic::Consultation, button)
    }

    fn reset_consultation_button(&self) -> RepositoryResult<ConsultationButton> {
        let button = ConsultationButton::default();
        self.save_consultation_button(&button)?;
        Ok(button)
    }
}
