// src/services/chatbot_service.rs
//
// Assistente de perguntas frequentes: respostas fixas por palavra-chave,
// sem estado nem persistência.

fn contem(mensagem: &str, palavras: &[&str]) -> bool {
    palavras.iter().any(|p| mensagem.contains(p))
}

pub fn responder(mensagem: &str) -> &'static str {
    let mensagem = mensagem.trim().to_lowercase();

    if mensagem.is_empty() {
        return "Diga alguma coisa!";
    }

    if contem(&mensagem, &["ola", "olá", "hello", "hi", "bom dia", "boa tarde"]) {
        "Olá! Sou o assistente da universidade. Em que posso ajudar?"
    } else if contem(&mensagem, &["matricul", "inscri", "registar", "admiss"]) {
        "Para se matricular, use o botão 'Registar' no canto superior direito. Depois escolha o curso no catálogo e siga o passo de pagamento."
    } else if contem(&mensagem, &["taxa", "pagamento", "preço", "preco", "custo", "valor", "pagar"]) {
        "Aceitamos pagamento por UPI e transferência bancária. As taxas de cada curso estão na página 'Cursos'."
    } else if contem(&mensagem, &["curso", "disciplina", "programa", "área", "area"]) {
        "Temos cursos de Science, Commerce e Arts nos níveis 1st PU e 2nd PU. Veja o catálogo completo na página 'Cursos'."
    } else if contem(&mensagem, &["contacto", "contato", "ajuda", "suporte", "telefone", "email"]) {
        "Pode contactar a secretaria em admin@universidade.edu."
    } else if contem(&mensagem, &["obrigado", "obrigada", "valeu"]) {
        "De nada! Diga se tiver mais alguma questão."
    } else if contem(&mensagem, &["adeus", "tchau", "até logo", "ate logo"]) {
        "Até logo! Bom dia de estudos."
    } else {
        "Desculpe, não percebi. Pode perguntar sobre matrículas, taxas, cursos ou contactos."
    }
}

#[cfg(test)]
mod tests {
    use super::responder;

    #[test]
    fn responde_sobre_matriculas() {
        assert!(responder("como faço a matrícula?").contains("Registar"));
    }

    #[test]
    fn fallback_para_mensagens_desconhecidas() {
        assert!(responder("xyzzy").contains("não percebi"));
    }

    #[test]
    fn mensagem_vazia() {
        assert_eq!(responder("   "), "Diga alguma coisa!");
    }
}
