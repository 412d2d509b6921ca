// src/services/notify_service.rs
//
// Colaborador de notificações transacionais. O núcleo nunca bloqueia a
// conclusão de um fluxo no resultado de um envio: falhas são registadas
// no log e nunca reenviadas. O transporte SMTP real fica fora deste
// repositório; esta struct é o ponto onde ele encaixaria.
use std::env;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct Mailer {
    pub remetente: String,
    // Desligado por omissão em dev/testes: só regista no log.
    pub ativo: bool,
}

impl Mailer {
    pub fn from_env() -> Self {
        let remetente = env::var("MAIL_USERNAME")
            .unwrap_or_else(|_| "noreply@universidade.edu".to_string());
        let ativo = env::var("MAIL_ENABLED")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        if !ativo {
            tracing::warn!("⚠️ MAIL_ENABLED não definido: emails serão apenas registados no log.");
        }
        Mailer { remetente, ativo }
    }

    /// Mailer inerte para testes.
    pub fn desativado() -> Self {
        Mailer { remetente: "noreply@universidade.edu".to_string(), ativo: false }
    }

    /// Envia (ou regista) um email transacional. Retorna sucesso/falha;
    /// cabe ao chamador decidir ignorar a falha.
    pub async fn enviar(
        &self,
        para: &str,
        assunto: &str,
        corpo: &str,
        anexo: Option<&str>,
    ) -> bool {
        // Anexo só segue se o ficheiro existir (comportamento herdado:
        // a falta do PDF de regulamento não impede o envio).
        let anexo_valido = match anexo {
            Some(caminho) if Path::new(caminho).exists() => Some(caminho),
            Some(caminho) => {
                tracing::warn!("Anexo '{}' não encontrado; email segue sem anexo.", caminho);
                None
            }
            None => None,
        };

        if !self.ativo {
            tracing::info!(
                "📧 [simulado] de='{}' para='{}' assunto='{}' anexo={:?}\n{}",
                self.remetente, para, assunto, anexo_valido, corpo
            );
            return true;
        }

        // Ponto de integração do transporte real. Enquanto não existe,
        // tratamos o envio "ativo" como falha registada, nunca como panic.
        tracing::error!(
            "❌ Envio real de email não configurado (para='{}', assunto='{}').",
            para, assunto
        );
        false
    }
}
