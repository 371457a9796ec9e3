use serde_json::{json, Value};

/// JSON Schema (draft 2020-12) for the feed documents under the API root.
pub fn api_schema(planet_name: &str) -> Value {
    json!({
        "$schema": "https://json-schema.org/draft/2020-12/schema",
        "title": format!("{planet_name} API Schema"),
        "description": "JSON Feed 1.1 documents with _planet_ extensions",
        "$defs": {
            "feed": {
                "type": "object",
                "properties": {
                    "version": { "type": "string" },
                    "title": { "type": "string" },
                    "home_page_url": { "type": "string", "format": "uri" },
                    "description": { "type": "string" },
                    "_planet_generated": { "type": "string", "format": "date-time" },
                    "_planet_period": { "type": "string" },
                    "items": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/item" }
                    }
                },
                "required": ["version", "title", "items"]
            },
            "item": {
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "url": { "type": "string", "format": "uri" },
                    "title": { "type": "string" },
                    "date_published": { "type": "string", "format": "date-time" },
                    "summary": { "type": "string" },
                    "content_html": { "type": "string" },
                    "image": { "type": "string", "format": "uri" },
                    "authors": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/author" }
                    },
                    "tags": {
                        "type": "array",
                        "items": { "type": "string" }
                    },
                    "_planet_feed_title": { "type": "string" },
                    "_planet_feed_url": { "type": "string", "format": "uri" },
                    "_planet_feed_icon": { "type": "string", "format": "uri" },
                    "_planet_image_alt": { "type": "string" },
                    "_planet_priority": { "type": "boolean" },
                    "_planet_rank": { "type": "integer" },
                    "_planet_discussions": {
                        "type": "array",
                        "items": { "$ref": "#/$defs/discussion" }
                    },
                    "_planet_source": { "$ref": "#/$defs/source" }
                },
                "required": ["id"]
            },
            "author": {
                "type": "object",
                "properties": {
                    "name": { "type": "string" },
                    "url": { "type": "string", "format": "uri" }
                }
            },
            "discussion": {
                "type": "object",
                "properties": {
                    "platform": { "type": "string" },
                    "url": { "type": "string", "format": "uri" },
                    "id": { "type": "string" },
                    "score": { "type": "integer" },
                    "comments": { "type": "integer" }
                },
                "required": ["platform", "url"]
            },
            "source": {
                "type": "object",
                "properties": {
                    "platform": { "type": "string" },
                    "author": { "type": "string" },
                    "postId": { "type": "string" }
                },
                "required": ["platform"]
            }
        }
    })
}
