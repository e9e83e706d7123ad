use serde_json::{json, Value};
use std::sync::LazyLock;

pub static CONFIG_SCHEMA: LazyLock<Value> = LazyLock::new(|| {
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "type": "object",
        "additionalProperties": false,
        "properties": {
            "server": {
                "type": "object",
                "properties": {
                    "host": { "type": "string" },
                    "port": { "type": "integer", "minimum": 1, "maximum": 65535 },
                    "cors_origins": { "type": "array", "items": { "type": "string" } }
                }
            },
            "database": {
                "type": "object",
                "properties": {
                    "path": { "type": "string" }
                }
            },
            "auth": {
                "type": "object",
                "properties": {
                    "jwt_secret": { "type": "string" },
                    "token_ttl_minutes": { "type": "integer", "minimum": 1 }
                }
            },
            "scanner": {
                "type": "object",
                "properties": {
                    "socket_path": { "type": "string" },
                    "username": { "type": "string" },
                    "password": { "type": "string" }
                }
            },
            "llm": {
                "type": "object",
                "properties": {
                    "provider": { "type": "string", "enum": ["gemini", "anthropic", "openai", "local"] },
                    "model": { "type": "string" },
                    "api_key": { "type": "string" },
                    "base_url": { "type": "string" }
                }
            },
            "logging": {
                "type": "object",
                "properties": {
                    "level": { "type": "string" },
                    "format": { "type": "string", "enum": ["pretty", "json"] }
                }
            }
        }
    })
});
