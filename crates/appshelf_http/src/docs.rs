use axum::Json;
use serde_json::{json, Value};

/// OpenAPI document describing the catalog endpoint.
pub(crate) async fn openapi() -> Json<Value> {
    Json(json!({
        "openapi": "3.0.3",
        "info": {
            "title": "appshelf",
            "description": "Container images of a registry namespace presented as apps",
            "version": env!("CARGO_PKG_VERSION"),
        },
        "paths": {
            "/apps": {
                "get": {
                    "summary": "List apps",
                    "description": "One entry per repository of the configured namespace. \
                        Repositories whose metadata cannot be fetched are omitted or \
                        reported with placeholder values.",
                    "responses": {
                        "200": {
                            "description": "Catalog of apps, possibly empty",
                            "content": {
                                "application/json": {
                                    "schema": {
                                        "type": "array",
                                        "items": { "$ref": "#/components/schemas/App" }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        },
        "components": {
            "schemas": {
                "App": {
                    "type": "object",
                    "required": ["name", "location", "description", "pictureUrl"],
                    "properties": {
                        "name": { "type": "string" },
                        "location": {
                            "type": "string",
                            "description": "Repository as <namespace>/<repo>"
                        },
                        "description": { "type": "string" },
                        "pictureUrl": { "type": "string", "format": "uri" }
                    }
                }
            }
        }
    }))
}
