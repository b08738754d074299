//! Utilities for services building

use access::Gate;
use actix_web::web::{Data, ServiceConfig};
use actix_web::{HttpMessage, middleware};
use actix_web::{HttpRequest, HttpResponse, Result, get, web};
use async_graphql::EmptySubscription;
use async_graphql::http::GraphiQLSource;
use async_graphql_actix_web::{GraphQLRequest, GraphQLResponse};


mod auth;
mod gate;
mod session;

use crate::config;
use crate::model::Model;
use crate::model::validation::Profile;
use crate::mutation::Mutation;
use crate::query::Query;

/// Root GraphQL schema
pub type Schema = async_graphql::Schema<Query, Mutation, EmptySubscription>;

/// GraphQL endpoint path
const GRAPHQL_PATH: &str = "/api/graphql";

/// ActixWeb GraphQL endpoint
async fn api(schema: Data<Schema>, req: HttpRequest, request: GraphQLRequest) -> GraphQLResponse {
    let mut request = request.into_inner();
    if let Some(profile) = req.extensions_mut().remove::<Profile>() {
        request = request.data(profile);
    }
    schema.execute(request).await.into()
}

/// ActixWeb GraphQLi endpoint
#[get("/pg")]
async fn graphiql() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(GraphiQLSource::build().endpoint(GRAPHQL_PATH).finish()))
}

/// Returns configuration function for the ActixWeb services
///
/// Every service is placed behind the edge gate. The gate itself skips API paths, those check the
/// session on their own.
pub async fn configure(
    graphiql_enabled: bool,
    context: Model,
    settings: config::Session,
) -> color_eyre::Result<impl Fn(&mut web::ServiceConfig) + Clone> {
    let cfg = move |cfg: &mut ServiceConfig| {
        let graphql = web::resource(GRAPHQL_PATH)
            .wrap(middleware::from_fn(session::middleware))
            .route(web::post().to(api));

        let console = web::scope("")
            .wrap(middleware::from_fn(gate::middleware))
            .service(auth::check)
            .service(auth::login)
            .service(auth::logout)
            .service(graphql);

        let console = if graphiql_enabled {
            console.service(graphiql)
        } else {
            console
        };

        cfg.app_data(Data::new(context.schema()))
            .app_data(Data::new(context.clone()))
            .app_data(Data::new(settings.clone()))
            .app_data(Data::new(Gate::default()))
            .app_data(auth::json_config())
            .service(console);
    };

    Ok(cfg)
}
