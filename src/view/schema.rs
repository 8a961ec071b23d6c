use serde_json::{json, Value};

/// Index definition sent when a view index is created.
///
/// Identity and filter fields are keywords so `term` queries match exact
/// values; text fields keep the engine's standard analysis.
pub fn default_definition() -> Value {
    let keyword = json!({ "type": "keyword" });
    let date = json!({ "type": "date" });

    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": {
            "properties": {
                "uuid": keyword,
                "locale": keyword,
                "title": { "type": "text", "fields": { "raw": keyword } },
                "routePath": keyword,
                "parentPageUuid": keyword,
                "type": keyword,
                "typeTranslation": { "type": "text", "fields": { "raw": keyword } },
                "structureType": keyword,
                "changed": date,
                "created": date,
                "authored": date,
                "published": date,
                "publishedState": { "type": "boolean" },
                "changerContactId": { "type": "long" },
                "creatorContactId": { "type": "long" },
                "authorId": { "type": "long" },
                "authorFullName": { "type": "text", "fields": { "raw": keyword } },
                "creatorFullName": { "type": "text", "fields": { "raw": keyword } },
                "changerFullName": { "type": "text", "fields": { "raw": keyword } },
                "contentData": { "type": "text", "index": false },
                "teaserDescription": { "type": "text" },
                "teaserMediaId": { "type": "long" },
                "localizationState": {
                    "properties": {
                        "state": keyword,
                        "locale": keyword
                    }
                },
                "excerpt": {
                    "properties": {
                        "tags": { "properties": { "id": { "type": "long" }, "name": keyword } },
                        "categories": { "properties": { "id": { "type": "long" }, "key": keyword } }
                    }
                },
                "seo": {
                    "properties": {
                        "hideInSitemap": { "type": "boolean" },
                        "noIndex": { "type": "boolean" },
                        "noFollow": { "type": "boolean" }
                    }
                },
                "pages": {
                    "properties": {
                        "uuid": keyword,
                        "routePath": keyword,
                        "pageNumber": { "type": "integer" },
                        "contentData": { "type": "text", "index": false }
                    }
                }
            }
        }
    })
}
