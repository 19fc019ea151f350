#![allow(dead_code)]

use serde_json::{json, Value};

pub struct MovieFixture {
    pub id: Value,
    pub title: &'static str,
    pub budget: i64,
    pub revenue: i64,
    pub vote_count: i64,
    pub vote_average: f64,
    pub status: &'static str,
    pub genres: &'static [&'static str],
    pub collection: Option<&'static str>,
    pub cast: &'static [&'static str],
    pub directors: &'static [&'static str],
}

impl MovieFixture {
    pub fn new(id: i64, title: &'static str) -> Self {
        Self {
            id: json!(id),
            title,
            budget: 50_000_000,
            revenue: 150_000_000,
            vote_count: 1_000,
            vote_average: 7.0,
            status: "Released",
            genres: &["Drama"],
            collection: None,
            cast: &["Lead Actor", "Supporting Actor"],
            directors: &["Some Director"],
        }
    }

    /// A full TMDB detail record with credits appended
    pub fn record(&self) -> Value {
        let mut crew: Vec<Value> = self
            .directors
            .iter()
            .map(|name| json!({"name": name, "job": "Director"}))
            .collect();
        crew.push(json!({"name": "Composer", "job": "Original Music Composer"}));

        json!({
            "adult": false,
            "belongs_to_collection": self.collection.map(|name| json!({"id": 10, "name": name})),
            "budget": self.budget,
            "genres": self.genres.iter().enumerate().map(|(i, name)| json!({"id": i, "name": name})).collect::<Vec<_>>(),
            "homepage": "https://example.com",
            "id": self.id,
            "imdb_id": "tt0000001",
            "origin_country": ["US"],
            "original_language": "en",
            "original_title": self.title,
            "overview": "A movie.",
            "popularity": 42.5,
            "poster_path": "/poster.jpg",
            "production_companies": [{"id": 1, "name": "Studio One"}, {"id": 2, "name": "Studio Two"}],
            "production_countries": [{"iso_3166_1": "US", "name": "United States of America"}],
            "release_date": "1995-06-30",
            "revenue": self.revenue,
            "runtime": 120,
            "spoken_languages": [{"english_name": "English", "iso_639_1": "en", "name": "English"}],
            "status": self.status,
            "tagline": "No Tagline",
            "title": self.title,
            "video": false,
            "vote_average": self.vote_average,
            "vote_count": self.vote_count,
            "credits": {
                "cast": self.cast.iter().map(|name| json!({"name": name, "character": "Someone"})).collect::<Vec<_>>(),
                "crew": crew,
            }
        })
    }
}
