//! GraphQL API access control

use actix_web::http::StatusCode;
use actix_web::{App, test};
use serde_json::{Value, json};

use crate::config;
use crate::model::Model;
use crate::model::roles::Role;
use crate::model::users::{NewUser, User, UserId};
use crate::service;
use crate::service::tests::{GraphQLResp, gql, session_cookie, signed_in};

const VIEWER: &str = r#"
    query Viewer {
        viewer {
            id email role { name } permissions
            canView: can(permission: "users:view")
            canDelete: can(permission: "users:delete")
        }
    }
"#;

const ALL_USERS: &str = "query { users { all { id email status } } }";

const SET_STATUS: &str = r#"
    mutation SetStatus($userId: UserId!, $status: String!) {
        users { setStatus(userId: $userId, status: $status) }
    }
"#;

const CREATE_USER: &str = r#"
    mutation Create($email: String!, $name: String!, $password: String!, $permissions: [String!]!) {
        users { create(email: $email, name: $name, password: $password, permissions: $permissions) }
    }
"#;

macro_rules! graphql {
    ($app:expr, $body:expr) => {
        graphql!($app, $body, None::<String>)
    };
    ($app:expr, $body:expr, $token:expr) => {{
        let req = test::TestRequest::post()
            .uri("/api/graphql")
            .insert_header(("Content-Type", "application/json"))
            .set_payload($body);
        let req = match $token {
            Some(token) => req.cookie(session_cookie(token)),
            None => req,
        };

        let resp = test::call_service(&$app, req.to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let resp: GraphQLResp = test::read_body_json(resp).await;
        resp
    }};
}

#[actix_web::test]
async fn viewer() {
    let model = Model::test().await.unwrap();
    let role = Role::create(model.db(), "support", ["users:*"]).await.unwrap();
    let (user_id, token) = signed_in(
        &model,
        NewUser::new("one@example.com", "One", "pw")
            .role(role.id)
            .permissions(["reports:view"]),
    )
    .await;

    let service_config = service::configure(false, model, config::Session::default())
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let resp = graphql!(app, gql(VIEWER, json!({})));
    assert_eq!(resp.errors, None);
    assert_eq!(resp.data::<Value>("viewer").unwrap(), Value::Null);

    let resp = graphql!(app, gql(VIEWER, json!({})), Some(&token));
    assert_eq!(resp.errors, None);
    assert_eq!(resp.data::<UserId>("viewer.id").unwrap(), user_id);
    assert_eq!(resp.data::<String>("viewer.role.name").unwrap(), "support");
    assert_eq!(
        resp.data::<Vec<String>>("viewer.permissions").unwrap(),
        ["reports:view", "users:*"]
    );
    assert!(resp.data::<bool>("viewer.canView").unwrap());
    assert!(resp.data::<bool>("viewer.canDelete").unwrap());
}

#[actix_web::test]
async fn listing_users_requires_permission() {
    let model = Model::test().await.unwrap();
    let (_, viewer) = signed_in(
        &model,
        NewUser::new("viewer@example.com", "Viewer", "pw").permissions(["users:view"]),
    )
    .await;
    let (_, other) = signed_in(
        &model,
        NewUser::new("other@example.com", "Other", "pw").permissions(["reports:*"]),
    )
    .await;

    let service_config = service::configure(false, model, config::Session::default())
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let resp = graphql!(app, gql(ALL_USERS, json!({})));
    assert_eq!(resp.error_messages(), ["Unauthorized"]);

    let resp = graphql!(app, gql(ALL_USERS, json!({})), Some(&other));
    assert_eq!(resp.error_messages(), ["Forbidden"]);

    let resp = graphql!(app, gql(ALL_USERS, json!({})), Some(&viewer));
    assert_eq!(resp.errors, None);
    let users: Vec<Value> = resp.data("users.all").unwrap();
    let mut emails: Vec<_> = users
        .iter()
        .filter_map(|user| user["email"].as_str())
        .collect();
    emails.sort();
    assert_eq!(emails, ["other@example.com", "viewer@example.com"]);
}

#[actix_web::test]
async fn suspending_user_ends_sessions() {
    let model = Model::test().await.unwrap();
    let (_, admin) = signed_in(
        &model,
        NewUser::new("admin@example.com", "Admin", "pw").permissions(["*"]),
    )
    .await;
    let (target_id, target) =
        signed_in(&model, NewUser::new("target@example.com", "Target", "pw")).await;

    let service_config = service::configure(false, model.clone(), config::Session::default())
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let variables = json!({ "userId": target_id, "status": "suspended" });

    let resp = graphql!(app, gql(SET_STATUS, variables.clone()), Some(&target));
    assert_eq!(resp.error_messages(), ["Forbidden"]);

    let resp = graphql!(app, gql(SET_STATUS, variables), Some(&admin));
    assert_eq!(resp.errors, None);
    assert_eq!(resp.data::<UserId>("users.setStatus").unwrap(), target_id);

    let user = User::fetch(model.db(), target_id).await.unwrap().unwrap();
    assert_eq!(user.status, "suspended");

    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/api/auth/check")
            .cookie(session_cookie(&target))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = graphql!(
        app,
        gql(
            SET_STATUS,
            json!({ "userId": "00000000-0000-0000-0000-000000000000", "status": "active" })
        ),
        Some(&admin)
    );
    assert_eq!(resp.error_messages(), ["User not found"]);
}

#[actix_web::test]
async fn created_user_can_sign_in() {
    let model = Model::test().await.unwrap();
    let (_, admin) = signed_in(
        &model,
        NewUser::new("admin@example.com", "Admin", "pw").permissions(["users:create"]),
    )
    .await;

    let service_config = service::configure(false, model, config::Session::default())
        .await
        .unwrap();
    let app = test::init_service(App::new().configure(service_config)).await;

    let variables = json!({
        "email": "new@example.com",
        "name": "New",
        "password": "fresh",
        "permissions": ["customers:view"],
    });

    let resp = graphql!(app, gql(CREATE_USER, variables.clone()));
    assert_eq!(resp.error_messages(), ["Unauthorized"]);

    let resp = graphql!(app, gql(CREATE_USER, variables), Some(&admin));
    assert_eq!(resp.errors, None);
    let user_id: UserId = resp.data("users.create").unwrap();

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({ "email": "new@example.com", "password": "fresh" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["user"]["id"], json!(user_id));
    assert_eq!(body["user"]["permissions"], json!(["customers:view"]));
}
