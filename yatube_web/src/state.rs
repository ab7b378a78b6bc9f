use std::{sync::Arc, time::Duration};

use yatube_core::YatubeCore;

use crate::{
    auth::SessionStore,
    cache::PageCache,
    captcha::{CaptchaVerifier, ChallengeCaptcha, DisabledCaptcha},
};

pub struct AppState {
    pub core: YatubeCore,
    pub page_cache: PageCache,
    pub sessions: SessionStore,
    pub captcha: Arc<dyn CaptchaVerifier>,
}

impl AppState {
    pub fn new(core: YatubeCore) -> Arc<Self> {
        let captcha: Arc<dyn CaptchaVerifier> = if core.config.captcha_enabled {
            Arc::new(ChallengeCaptcha::new())
        } else {
            Arc::new(DisabledCaptcha)
        };

        Self::with_captcha(core, captcha)
    }

    pub fn with_captcha(core: YatubeCore, captcha: Arc<dyn CaptchaVerifier>) -> Arc<Self> {
        let page_cache = PageCache::new(Duration::from_secs(core.config.page_cache_ttl_secs));
        let sessions = SessionStore::new(Duration::from_secs(core.config.session_ttl_secs));

        Arc::new(Self {
            core,
            page_cache,
            sessions,
            captcha,
        })
    }
}
