use std::sync::Arc;

use axum::{routing::get, Json, Router};
use serde_json::{json, Map, Value};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{authz, models, routes};

#[derive(OpenApi)]
#[openapi(
	paths(
		routes::health::health,
		routes::auth::login,
		routes::auth::me,
		routes::users::create_user,
		routes::rbac::list_roles,
		routes::rbac::create_role,
		routes::rbac::list_action_types,
		routes::rbac::create_action_type,
		routes::rbac::get_role_permissions,
		routes::rbac::set_role_permission,
		routes::rbac::get_user_roles,
		routes::rbac::set_user_role
	),
	components(
		schemas(
			routes::health::HealthResponse,
			authz::Principal,
			models::user::UserProfile,
			models::user::LoginRequest,
			models::user::LoginResponse,
			models::user::CreateUserRequest,
			models::rbac::Role,
			models::rbac::RoleCreateRequest,
			models::rbac::ActionType,
			models::rbac::ActionTypeCreateRequest,
			models::rbac::RolePermissionRequest,
			models::rbac::UserRoleRequest,
			models::rbac::ReconcileResponse,
			models::rbac::ActionTypeFlag,
			models::rbac::RolePermissionMatrix,
			models::rbac::RoleFlag,
			models::rbac::UserRoleMatrix
		)
	),
	tags(
		(name = "Health", description = "Liveness"),
		(name = "Auth", description = "Login and session introspection"),
		(name = "Admin", description = "Users, roles and permission administration (ADMIN only)")
	)
)]
pub struct ApiDoc;

pub fn build_openapi(port: u16) -> anyhow::Result<utoipa::openapi::OpenApi> {
	let mut doc = serde_json::to_value(ApiDoc::openapi())?;

	ensure_security_components(&mut doc)?;
	ensure_global_security(&mut doc)?;
	ensure_servers(&mut doc, port);

	Ok(serde_json::from_value(doc)?)
}

pub fn swagger_routes(doc: utoipa::openapi::OpenApi) -> anyhow::Result<Router> {
	let swagger_config = utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"])
		.try_it_out_enabled(true)
		.with_credentials(true)
		.persist_authorization(true);

	let doc_json = Arc::new(serde_json::to_value(&doc)?);

	let json_route = {
		let doc_json = Arc::clone(&doc_json);
		get(move || {
			let doc_json = Arc::clone(&doc_json);
			async move { Json((*doc_json).clone()) }
		})
	};

	Ok(Router::new()
		.route("/api-docs/openapi.json", json_route)
		.merge(SwaggerUi::new("/docs").config(swagger_config)))
}

fn root_object(doc: &mut Value) -> anyhow::Result<&mut Map<String, Value>> {
	doc.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("OpenAPI root must be an object"))
}

fn ensure_security_components(doc: &mut Value) -> anyhow::Result<()> {
	let components = root_object(doc)?
		.entry("components")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("components must be an object"))?;

	let schemes = components
		.entry("securitySchemes")
		.or_insert_with(|| Value::Object(Map::new()))
		.as_object_mut()
		.ok_or_else(|| anyhow::anyhow!("securitySchemes must be an object"))?;

	schemes.insert(
		"bearerAuth".to_string(),
		json!({
			"type": "http",
			"scheme": "bearer",
			"bearerFormat": "JWT"
		}),
	);

	Ok(())
}

fn ensure_global_security(doc: &mut Value) -> anyhow::Result<()> {
	root_object(doc)?
		.entry("security")
		.or_insert_with(|| json!([{ "bearerAuth": [] }]));

	Ok(())
}

fn ensure_servers(doc: &mut Value, port: u16) {
	let server_url = format!("http://localhost:{}", port);

	match doc.get_mut("servers") {
		Some(Value::Array(arr)) => {
			let has = arr.iter().any(|v| v.get("url").and_then(Value::as_str) == Some(server_url.as_str()));
			if !has {
				arr.push(json!({ "url": server_url }));
			}
		}
		_ => {
			doc["servers"] = json!([{ "url": server_url }]);
		}
	}
}
