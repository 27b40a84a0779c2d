//! Request and response types for the site API.
//!
//! # Design
//! Field names follow the server's camelCase JSON; document ids arrive as
//! `_id`. Response types default missing fields so a partially filled
//! singleton (a fresh `hero` or `settings` document) still deserializes.
//! These types are defined independently from the mock server's; the
//! integration tests catch drift between the two.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Body of `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    pub token: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// `/about` singleton.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AboutUs {
    pub content: String,
    pub advantages: Vec<String>,
}

/// `/values` singleton.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Values {
    pub vision: String,
    pub mission: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Testimonial {
    #[serde(rename = "_id")]
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Text fields of a testimonial create/update; the image travels as an
/// `Upload`.
#[derive(Debug, Clone, Serialize)]
pub struct TestimonialInput {
    pub author: String,
    pub content: String,
}

/// A service card or a service detail entry; both resources share a shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceItem {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ServiceInput {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Client {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub logo: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ClientInput {
    pub name: String,
}

/// `/hero` singleton. On update the image travels as an `Upload` in the
/// `heroImage` field; `hero_image` here is the stored path.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Hero {
    pub badge_text: String,
    pub headline: String,
    pub subheadline: String,
    pub cta_text: String,
    pub cta_link: String,
    pub secondary_cta_text: String,
    pub secondary_cta_link: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hero_image: Option<String>,
}

/// `/settings` singleton: company contact details and social links.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub company_name: String,
    pub tagline: String,
    pub email: String,
    pub phone: String,
    pub whatsapp: String,
    pub address: String,
    pub instagram: String,
    pub facebook: String,
    pub twitter: String,
    pub linkedin: String,
    pub youtube: String,
    pub tiktok: String,
}

/// A message left through the public contact form.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub subject: Option<String>,
    pub message: String,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub is_replied: bool,
    #[serde(default)]
    pub email_sent: bool,
    #[serde(default)]
    pub reply_message: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Body of the anonymous `POST /contact`.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactReply {
    pub reply_message: String,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
pub struct UnreadCount {
    #[serde(default)]
    pub count: u64,
}

/// Body of `POST /analytics/track`.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TrackVisit {
    pub path: String,
    pub visitor_id: String,
}

/// Dashboard summary from `GET /analytics`.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Analytics {
    pub totals: Totals,
    pub traffic: Vec<TrafficPoint>,
    pub visitor_stats: Option<VisitorStats>,
    pub content_status: ContentStatus,
    pub last_updated: Option<String>,
}

impl Analytics {
    /// Total page views, preferring the server's own counter over the sum of
    /// the traffic series.
    pub fn total_views(&self) -> u64 {
        self.visitor_stats
            .as_ref()
            .map(|s| s.total_views)
            .unwrap_or_else(|| self.traffic.iter().map(|p| p.count).sum())
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct Totals {
    pub users: u64,
    pub clients: u64,
    pub testimonials: u64,
    pub service_cards: u64,
    pub service_details: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TrafficPoint {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct VisitorStats {
    pub total_views: u64,
    pub unique_visitors: u64,
    pub devices: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ContentStatus {
    pub about_sections: bool,
    pub values_sections: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testimonial_reads_mongo_style_id() {
        let t: Testimonial = serde_json::from_str(
            r#"{"_id":"65f0c2","author":"Jane","content":"Great work","image":"/uploads/jane.png"}"#,
        )
        .unwrap();
        assert_eq!(t.id, "65f0c2");
        assert_eq!(t.image.as_deref(), Some("/uploads/jane.png"));
    }

    #[test]
    fn empty_singletons_deserialize() {
        let hero: Hero = serde_json::from_str("{}").unwrap();
        assert_eq!(hero, Hero::default());
        let settings: Settings = serde_json::from_str(r#"{"companyName":"DSF"}"#).unwrap();
        assert_eq!(settings.company_name, "DSF");
        assert!(settings.tiktok.is_empty());
    }

    #[test]
    fn hero_serializes_camel_case_without_image() {
        let hero = Hero {
            headline: "Grow online".to_string(),
            cta_link: "#contact".to_string(),
            ..Hero::default()
        };
        let json = serde_json::to_value(&hero).unwrap();
        assert_eq!(json["headline"], "Grow online");
        assert_eq!(json["ctaLink"], "#contact");
        assert!(json.get("heroImage").is_none());
    }

    #[test]
    fn contact_submission_omits_empty_optionals() {
        let body = serde_json::to_value(ContactSubmission {
            name: "X".to_string(),
            email: "x@x.com".to_string(),
            phone: None,
            subject: None,
            message: "hi".to_string(),
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"name":"X","email":"x@x.com","message":"hi"}));
    }

    #[test]
    fn analytics_total_views_falls_back_to_traffic() {
        let analytics: Analytics = serde_json::from_str(
            r#"{"traffic":[{"date":"2026-10-01","count":3},{"date":"2026-10-02","count":4}]}"#,
        )
        .unwrap();
        assert_eq!(analytics.total_views(), 7);

        let analytics: Analytics =
            serde_json::from_str(r#"{"visitorStats":{"totalViews":42,"uniqueVisitors":9}}"#)
                .unwrap();
        assert_eq!(analytics.total_views(), 42);
    }

    #[test]
    fn track_visit_uses_camel_case() {
        let body = serde_json::to_value(TrackVisit {
            path: "/".to_string(),
            visitor_id: "v_1_abc".to_string(),
        })
        .unwrap();
        assert_eq!(body["visitorId"], "v_1_abc");
    }
}
