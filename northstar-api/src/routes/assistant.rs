use axum::{extract::State, routing::post, Json, Router};
use openai_client::{ChatMessage, ChatRequest};
use tracing::instrument;

use crate::{
    domain::assistant::{
        build_system_prompt, extract_search_terms, mentions_recommendation,
        BusinessContext, ChatBody, ChatReply, ChatSuggestion, ChatTurnRole,
        SuggestedBusiness,
    },
    routes::ApiError,
    AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/chat", post(chat))
}

/// Directory chat. Degrades to a fixed apology on any AI failure; this
/// endpoint never surfaces a 5xx for the completion call.
#[instrument(name = "POST /assistant/chat", skip(app_state, body))]
async fn chat(
    State(app_state): State<AppState>,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatReply>, ApiError> {
    let Some(chat_client) = &app_state.chat else {
        return Ok(Json(ChatReply::fallback()));
    };

    let business_context = match body.context.business_id {
        Some(business_id) => business_context(&app_state, business_id).await,
        None => None,
    };

    let mut messages = vec![ChatMessage::system(build_system_prompt(
        business_context.as_ref(),
    ))];
    for turn in &body.messages {
        messages.push(match turn.role {
            ChatTurnRole::User => ChatMessage::user(&turn.content),
            ChatTurnRole::Assistant => ChatMessage::assistant(&turn.content),
        });
    }

    let request = ChatRequest::new(app_state.chat_model.clone(), messages)
        .with_temperature(0.7)
        .with_max_tokens(500);

    let reply = match chat_client.complete(&request).await {
        Ok(content) => content,
        Err(err) => {
            tracing::warn!("Chat completion failed: {err}");
            return Ok(Json(ChatReply::fallback()));
        }
    };

    let suggestions = if mentions_recommendation(&reply) {
        collect_suggestions(&app_state, &reply).await
    } else {
        vec![]
    };

    Ok(Json(ChatReply {
        message: reply,
        suggestions,
    }))
}

/// Business facts for the system prompt. A stale or unknown id silently
/// degrades to the generic prompt.
async fn business_context(app_state: &AppState, business_id: i32) -> Option<BusinessContext> {
    let business = app_state.business_repo.get_business(business_id).await.ok()?;
    let categories = app_state
        .business_repo
        .categories_for(business_id)
        .await
        .unwrap_or_default();

    Some(BusinessContext {
        name: business.name,
        category: categories.first().map(|c| c.name.clone()),
        description: business.description,
    })
}

async fn collect_suggestions(app_state: &AppState, reply: &str) -> Vec<ChatSuggestion> {
    let terms = extract_search_terms(reply);
    let businesses = match app_state.search_service.find_by_terms(&terms, 3).await {
        Ok(businesses) => businesses,
        Err(err) => {
            tracing::warn!("Suggestion lookup failed: {err}");
            return vec![];
        }
    };

    businesses
        .into_iter()
        .map(|b| ChatSuggestion {
            kind: "business".to_string(),
            data: SuggestedBusiness {
                id: b.id,
                name: b.name,
                slug: b.slug,
                category: b.categories.first().map(|c| c.name.clone()),
                rating: b.average_rating,
            },
        })
        .collect()
}
