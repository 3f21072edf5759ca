use askama::Template;
use axum::response::IntoResponse;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub current_page: &'static str,
}

#[derive(Template)]
#[template(path = "weather.html")]
pub struct WeatherTemplate {
    pub current_page: &'static str,
}

#[derive(Template)]
#[template(path = "leaf.html")]
pub struct LeafTemplate {
    pub current_page: &'static str,
}

#[derive(Template)]
#[template(path = "chat.html")]
pub struct ChatTemplate {
    pub current_page: &'static str,
}

pub async fn index() -> impl IntoResponse {
    IndexTemplate {
        current_page: "home",
    }
}

pub async fn weather() -> impl IntoResponse {
    WeatherTemplate {
        current_page: "weather",
    }
}

pub async fn leaf() -> impl IntoResponse {
    LeafTemplate {
        current_page: "leaf",
    }
}

pub async fn chat() -> impl IntoResponse {
    ChatTemplate {
        current_page: "chat",
    }
}
