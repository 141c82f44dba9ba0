use std::sync::Arc;

use openai_client::ChatClient;
use sqlx::PgPool;

use crate::{
    config::Settings,
    domain::search::{
        enhancer::OpenAiEnhancer, repository::PgCandidateRepository, SearchService,
    },
    repositories::{
        AnalyticsRepository, BusinessRepository, CategoryRepository, ClaimRepository,
        EventRepository, ReviewRepository, UserRepository,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub business_repo: Arc<BusinessRepository>,
    pub category_repo: Arc<CategoryRepository>,
    pub event_repo: Arc<EventRepository>,
    pub review_repo: Arc<ReviewRepository>,
    pub claim_repo: Arc<ClaimRepository>,
    pub user_repo: Arc<UserRepository>,
    pub analytics_repo: Arc<AnalyticsRepository>,
    pub search_service: Arc<SearchService<PgCandidateRepository, OpenAiEnhancer>>,
    /// `None` when no AI key is configured; chat and recommendations
    /// degrade, search runs raw-text only.
    pub chat: Option<ChatClient>,
    pub chat_model: String,
    pub public_api_key_hash: Option<String>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: &Settings) -> Self {
        let chat = config.ai.enabled().then(|| match &config.ai.base_url {
            Some(base_url) => ChatClient::with_base_url(&config.ai.api_key, base_url)
                .expect("Invalid AI base URL in configuration"),
            None => ChatClient::new(&config.ai.api_key),
        });

        let enhancer = chat
            .clone()
            .map(|client| OpenAiEnhancer::new(client, config.ai.chat_model.clone()));
        let search_service = Arc::new(SearchService::new(
            PgCandidateRepository::new(db_pool.clone()),
            enhancer,
        ));

        Self {
            business_repo: Arc::new(BusinessRepository::new(db_pool.clone())),
            category_repo: Arc::new(CategoryRepository::new(db_pool.clone())),
            event_repo: Arc::new(EventRepository::new(db_pool.clone())),
            review_repo: Arc::new(ReviewRepository::new(db_pool.clone())),
            claim_repo: Arc::new(ClaimRepository::new(db_pool.clone())),
            user_repo: Arc::new(UserRepository::new(db_pool.clone())),
            analytics_repo: Arc::new(AnalyticsRepository::new(db_pool)),
            search_service,
            chat,
            chat_model: config.ai.chat_model.clone(),
            public_api_key_hash: config.public_api.key_hash.clone(),
        }
    }
}
