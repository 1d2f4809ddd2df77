//! Embedding <-> JSON column conversions.

use sea_orm::entity::prelude::Json;

pub fn embedding_to_json(embedding: &[f32]) -> Json {
    Json::Array(
        embedding
            .iter()
            .map(|v| Json::from(f64::from(*v)))
            .collect(),
    )
}

pub fn embedding_from_json(json: &Json) -> Option<Vec<f32>> {
    json.as_array().map(|values| {
        values
            .iter()
            .filter_map(Json::as_f64)
            .map(|v| v as f32)
            .collect()
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn embedding_round_trips_through_json() {
        let embedding = vec![0.25_f32, -1.0, 3.5];
        let json = embedding_to_json(&embedding);
        assert_eq!(embedding_from_json(&json).unwrap(), embedding);
    }

    #[test]
    fn non_array_json_is_rejected() {
        assert!(embedding_from_json(&Json::from("oops")).is_none());
    }
}
