// src/web/chatbot_handlers.rs
use crate::services::chatbot_service;
use axum::Json;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct PerguntaPayload {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct RespostaPayload {
    pub response: &'static str,
}

// POST /chatbot/ask
pub async fn ask(Json(payload): Json<PerguntaPayload>) -> Json<RespostaPayload> {
    let resposta = chatbot_service::responder(&payload.message);
    tracing::debug!("Chatbot: '{}' -> '{}'", payload.message, resposta);
    Json(RespostaPayload { response: resposta })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_aceita_mensagem_ausente() {
        let payload: PerguntaPayload = serde_json::from_str("{}").unwrap();
        assert_eq!(payload.message, "");
    }

    #[test]
    fn resposta_serializa_com_o_campo_esperado() {
        let json = serde_json::to_value(RespostaPayload { response: "ola" }).unwrap();
        assert_eq!(json["response"], "ola");
    }
}
