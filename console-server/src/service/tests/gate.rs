//! Edge gate redirects

use access::{GateMode, SESSION_COOKIE, SESSION_TOKEN_COOKIE};
use actix_web::http::{StatusCode, header};
use actix_web::{App, test};

use crate::config;
use crate::model::Model;
use crate::model::auth::Session;
use crate::model::users::NewUser;
use crate::service;
use crate::service::tests::{removed_cookies, response_cookies, session_cookie, signed_in};

fn location<B>(resp: &actix_web::dev::ServiceResponse<B>) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|location| location.to_str().ok())
}

fn sentinel() -> config::Session {
    config::Session {
        gate: GateMode::Sentinel,
        ..Default::default()
    }
}

#[actix_web::test]
async fn sentinel_mode() {
    let model = Model::test().await.unwrap();
    let service_config = service::configure(false, model, sentinel()).await.unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let cases = [
        ("/dashboard", None, Some("/signin")),
        ("/dashboard", Some("authenticated"), None),
        ("/signin", Some("authenticated"), Some("/dashboard")),
        ("/signin", None, None),
        ("/reports/x", Some("garbage"), Some("/signin")),
        ("/settings/profile", Some("authenticated"), None),
        ("/", None, Some("/signin")),
        ("/", Some("authenticated"), Some("/dashboard")),
        ("/signup", None, None),
    ];

    for (path, cookie, redirect) in cases {
        let req = test::TestRequest::get().uri(path);
        let req = match cookie {
            Some(value) => req.cookie(session_cookie(value)),
            None => req,
        };

        let resp = test::call_service(&app, req.to_request()).await;
        match redirect {
            Some(target) => {
                assert_eq!(resp.status(), StatusCode::FOUND, "{path} {cookie:?}");
                assert_eq!(location(&resp), Some(target), "{path} {cookie:?}");
            }
            None => {
                // No pages are served here, passing the gate ends up in 404
                assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path} {cookie:?}");
                assert_eq!(location(&resp), None, "{path} {cookie:?}");
            }
        }
    }
}

#[actix_web::test]
async fn excluded_paths_skip_gate() {
    let model = Model::test().await.unwrap();
    let service_config = service::configure(false, model, sentinel()).await.unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    for path in [
        "/api/unknown",
        "/_next/static/chunk.js",
        "/favicon.ico",
        "/public/logo.png",
    ] {
        let resp = test::call_service(&app, test::TestRequest::get().uri(path).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{path}");
    }

    // API answers on its own, even without a session
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/auth/check").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn session_mode() {
    let model = Model::test().await.unwrap();
    let (_, token) = signed_in(&model, NewUser::new("one@example.com", "One", "pw")).await;
    let (_, revoked) = signed_in(&model, NewUser::new("two@example.com", "Two", "pw")).await;
    Session::revoke(model.db(), &revoked).await.unwrap();

    let service_config = service::configure(false, model, config::Session::default())
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/dashboard")
            .cookie(session_cookie(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/signin")
            .cookie(session_cookie(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), Some("/dashboard"));

    // The sentinel value is just an unknown token here
    for cookie in ["authenticated".to_owned(), revoked.to_string()] {
        let resp = test::call_service(
            &app,
            test::TestRequest::get()
                .uri("/customers")
                .cookie(session_cookie(&cookie))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::FOUND);
        assert_eq!(location(&resp), Some("/signin"));
    }
}

#[actix_web::test]
async fn session_mode_storage_failure() {
    let model = Model::test().await.unwrap();
    let (_, token) = signed_in(&model, NewUser::new("one@example.com", "One", "pw")).await;
    sqlx::query("drop table sessions")
        .execute(model.db())
        .await
        .unwrap();

    let service_config = service::configure(false, model, config::Session::default())
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/payments")
            .cookie(session_cookie(&token))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FOUND);
    assert_eq!(location(&resp), Some("/signin"));
}

#[actix_web::test]
async fn logged_in_user_passes_gate() {
    for settings in [config::Session::default(), sentinel()] {
        let mode = settings.gate;
        let model = Model::test().await.unwrap();
        NewUser::new("one@example.com", "One", "secret")
            .create(model.db())
            .await
            .unwrap();

        let service_config = service::configure(false, model, settings).await.unwrap();
        let app = test::init_service(App::new().configure(service_config)).await;

        let resp = test::call_service(
            &app,
            test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(serde_json::json!({ "email": "one@example.com", "password": "secret" }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK, "{mode:?}");
        let cookies = response_cookies(&resp);

        let with_cookies = |uri: &str| {
            cookies
                .iter()
                .cloned()
                .fold(test::TestRequest::get().uri(uri), |req, cookie| {
                    req.cookie(cookie)
                })
        };

        let resp = test::call_service(&app, with_cookies("/dashboard").to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND, "{mode:?}");

        let resp = test::call_service(&app, with_cookies("/signin").to_request()).await;
        assert_eq!(location(&resp), Some("/dashboard"), "{mode:?}");

        let resp = test::call_service(&app, with_cookies("/api/auth/check").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK, "{mode:?}");

        let logout = cookies.iter().cloned().fold(
            test::TestRequest::post().uri("/api/auth/logout"),
            |req, cookie| req.cookie(cookie),
        );
        let resp = test::call_service(&app, logout.to_request()).await;
        let expected = match mode {
            GateMode::Session => vec![SESSION_COOKIE],
            GateMode::Sentinel => vec![SESSION_COOKIE, SESSION_TOKEN_COOKIE],
        };
        assert_eq!(removed_cookies(&resp), expected, "{mode:?}");

        // Token no longer validates, even though the sentinel would still pass the gate
        let resp = test::call_service(&app, with_cookies("/api/auth/check").to_request()).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{mode:?}");
    }
}

#[actix_web::test]
async fn sentinel_login_cookies() {
    let model = Model::test().await.unwrap();
    NewUser::new("one@example.com", "One", "secret")
        .create(model.db())
        .await
        .unwrap();

    let service_config = service::configure(false, model, sentinel()).await.unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(serde_json::json!({ "email": "one@example.com", "password": "secret" }))
            .to_request(),
    )
    .await;

    let cookies = response_cookies(&resp);
    let value = |name: &str| {
        cookies
            .iter()
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_owned())
    };
    assert_eq!(value(SESSION_COOKIE).as_deref(), Some("authenticated"));
    let token = value(SESSION_TOKEN_COOKIE).unwrap();
    assert_ne!(token, "authenticated");
}
