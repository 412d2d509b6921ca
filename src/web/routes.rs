// src/web/routes.rs
use crate::{
    state::AppState,
    web::{
        admin_handlers, auth_handlers, chatbot_handlers, mw_admin, mw_auth, mw_student,
        student_handlers,
    },
};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotas Públicas ---
    let public_routes = Router::new()
        .route("/login", get(auth_handlers::show_login_form).post(auth_handlers::handle_login))
        .route("/logout", get(auth_handlers::handle_logout))
        .route("/register", get(auth_handlers::show_registo_form).post(auth_handlers::handle_registo))
        .route("/forgot-password", get(auth_handlers::show_esqueci_senha).post(auth_handlers::handle_esqueci_senha))
        .route("/manual-reset", get(auth_handlers::show_reset_manual).post(auth_handlers::handle_reset_manual))
        .route("/chatbot/ask", post(chatbot_handlers::ask))
        .route("/", get(|| async { axum::response::Redirect::permanent("/login") }));

    // --- Rotas de Admin ---
    // Exigem login E role admin
    let admin_routes = Router::new()
        .route("/dashboard", get(admin_handlers::dashboard))
        .route("/students", get(admin_handlers::alunos))
        .route("/students/edit/{user_id}",
            get(admin_handlers::show_editar_aluno)
            .post(admin_handlers::handle_editar_aluno)
        )
        .route("/students/delete/{user_id}", get(admin_handlers::apagar_aluno))
        .route("/courses", get(admin_handlers::cursos).post(admin_handlers::handle_criar_curso))
        .route("/courses/edit/{curso_id}",
            get(admin_handlers::show_editar_curso)
            .post(admin_handlers::handle_editar_curso)
        )
        .route("/courses/delete/{curso_id}", get(admin_handlers::apagar_curso))
        .route("/courses/{curso_id}/videos",
            get(admin_handlers::videos)
            .post(admin_handlers::handle_videos)
        )
        .route("/courses/sections/delete/{secao_id}", get(admin_handlers::apagar_secao))
        .route("/courses/videos/delete/{video_id}", get(admin_handlers::apagar_video))
        .route("/enrollments", get(admin_handlers::matriculas))
        .route("/report", get(admin_handlers::relatorio))
        .route("/settings", get(admin_handlers::settings).post(admin_handlers::handle_settings))
        // Aplica APENAS mw_admin aqui (mw_auth será aplicado no router pai)
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_admin::require_admin,
        ));

    // --- Rotas do Aluno ---
    let student_routes = Router::new()
        .route("/dashboard", get(student_handlers::dashboard))
        .route("/profile", get(student_handlers::show_perfil).post(student_handlers::handle_perfil))
        .route("/courses", get(student_handlers::cursos))
        .route("/course/{curso_id}", get(student_handlers::curso_detalhe))
        .route("/enroll/{curso_id}", get(student_handlers::inscrever))
        .route("/payment/{matricula_id}", get(student_handlers::pagamento_page))
        .route("/payment/{matricula_id}/process", post(student_handlers::processar_pagamento))
        .route("/confirmation/{matricula_id}", get(student_handlers::confirmacao))
        .route("/watch/{curso_id}", get(student_handlers::assistir))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_student::require_student,
        ));

    // --- Rotas Autenticadas (Combinando tudo) ---
    let authenticated_routes = Router::new()
        .nest("/admin", admin_routes)
        .nest("/student", student_routes)
        // Aplica require_auth a TODAS as rotas aninhadas acima
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            mw_auth::require_auth,
        ));

    // --- Router Final ---
    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}
