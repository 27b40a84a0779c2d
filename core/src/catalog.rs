//! Static catalog of every backend operation.

use crate::http::HttpMethod::{self, Delete, Get, Post, Put};
use crate::operation::{Operation, PayloadKind};

const fn op(
    name: &'static str,
    method: HttpMethod,
    path: &'static str,
    payload: PayloadKind,
    auth_required: bool,
) -> Operation {
    Operation {
        name,
        method,
        path,
        payload,
        auth_required,
    }
}

const NONE: PayloadKind = PayloadKind::None;
const JSON: PayloadKind = PayloadKind::Json;
const IMAGE: PayloadKind = PayloadKind::Multipart { file_field: "image" };
const LOGO: PayloadKind = PayloadKind::Multipart { file_field: "logo" };
const HERO_IMAGE: PayloadKind = PayloadKind::Multipart { file_field: "heroImage" };

// auth
pub const LOGIN: Operation = op("login", Post, "/auth/login", JSON, false);

// about / values
pub const GET_ABOUT_US: Operation = op("getAboutUs", Get, "/about", NONE, false);
pub const UPDATE_ABOUT_US: Operation = op("updateAboutUs", Put, "/about", JSON, true);
pub const GET_VALUES: Operation = op("getValues", Get, "/values", NONE, false);
pub const UPDATE_VALUES: Operation = op("updateValues", Put, "/values", JSON, true);

// testimonials
pub const GET_TESTIMONIALS: Operation = op("getTestimonials", Get, "/testimonial", NONE, false);
pub const ADD_TESTIMONIAL: Operation = op("addTestimonial", Post, "/testimonial", IMAGE, true);
pub const UPDATE_TESTIMONIAL: Operation =
    op("updateTestimonial", Put, "/testimonial/{id}", IMAGE, true);
pub const DELETE_TESTIMONIAL: Operation =
    op("deleteTestimonial", Delete, "/testimonial/{id}", NONE, true);

// service cards
pub const GET_SERVICE_CARDS: Operation = op("getServiceCards", Get, "/service-card", NONE, false);
pub const ADD_SERVICE_CARD: Operation = op("addServiceCard", Post, "/service-card", IMAGE, true);
pub const UPDATE_SERVICE_CARD: Operation =
    op("updateServiceCard", Put, "/service-card/{id}", IMAGE, true);
pub const DELETE_SERVICE_CARD: Operation =
    op("deleteServiceCard", Delete, "/service-card/{id}", NONE, true);

// service details
pub const GET_SERVICE_DETAILS: Operation =
    op("getServiceDetails", Get, "/service-detail", NONE, false);
pub const ADD_SERVICE_DETAIL: Operation =
    op("addServiceDetail", Post, "/service-detail", IMAGE, true);
pub const UPDATE_SERVICE_DETAIL: Operation =
    op("updateServiceDetail", Put, "/service-detail/{id}", IMAGE, true);
pub const DELETE_SERVICE_DETAIL: Operation =
    op("deleteServiceDetail", Delete, "/service-detail/{id}", NONE, true);

// clients
pub const GET_CLIENTS: Operation = op("getClients", Get, "/client", NONE, false);
pub const ADD_CLIENT: Operation = op("addClient", Post, "/client", LOGO, true);
pub const UPDATE_CLIENT: Operation = op("updateClient", Put, "/client/{id}", LOGO, true);
pub const DELETE_CLIENT: Operation = op("deleteClient", Delete, "/client/{id}", NONE, true);

// analytics
pub const GET_ANALYTICS: Operation = op("getAnalytics", Get, "/analytics", NONE, true);
pub const TRACK_VISIT: Operation = op("trackVisit", Post, "/analytics/track", JSON, false);

// contact messages
pub const GET_CONTACTS: Operation = op("getContacts", Get, "/contact", NONE, true);
pub const GET_UNREAD_COUNT: Operation = op("getUnreadCount", Get, "/contact/unread", NONE, true);
pub const SUBMIT_CONTACT: Operation = op("submitContact", Post, "/contact", JSON, false);
pub const MARK_CONTACT_AS_READ: Operation =
    op("markContactAsRead", Put, "/contact/{id}/read", JSON, true);
pub const REPLY_CONTACT: Operation = op("replyContact", Put, "/contact/{id}/reply", JSON, true);
pub const DELETE_CONTACT: Operation = op("deleteContact", Delete, "/contact/{id}", NONE, true);

// hero / settings
pub const GET_HERO: Operation = op("getHero", Get, "/hero", NONE, false);
pub const UPDATE_HERO: Operation = op("updateHero", Put, "/hero", HERO_IMAGE, true);
pub const GET_SETTINGS: Operation = op("getSettings", Get, "/settings", NONE, false);
pub const UPDATE_SETTINGS: Operation = op("updateSettings", Put, "/settings", JSON, true);

/// Every operation, in declaration order.
pub const CATALOG: &[Operation] = &[
    LOGIN,
    GET_ABOUT_US,
    UPDATE_ABOUT_US,
    GET_VALUES,
    UPDATE_VALUES,
    GET_TESTIMONIALS,
    ADD_TESTIMONIAL,
    UPDATE_TESTIMONIAL,
    DELETE_TESTIMONIAL,
    GET_SERVICE_CARDS,
    ADD_SERVICE_CARD,
    UPDATE_SERVICE_CARD,
    DELETE_SERVICE_CARD,
    GET_SERVICE_DETAILS,
    ADD_SERVICE_DETAIL,
    UPDATE_SERVICE_DETAIL,
    DELETE_SERVICE_DETAIL,
    GET_CLIENTS,
    ADD_CLIENT,
    UPDATE_CLIENT,
    DELETE_CLIENT,
    GET_ANALYTICS,
    TRACK_VISIT,
    GET_CONTACTS,
    GET_UNREAD_COUNT,
    SUBMIT_CONTACT,
    MARK_CONTACT_AS_READ,
    REPLY_CONTACT,
    DELETE_CONTACT,
    GET_HERO,
    UPDATE_HERO,
    GET_SETTINGS,
    UPDATE_SETTINGS,
];

pub fn find(name: &str) -> Option<&'static Operation> {
    CATALOG.iter().find(|op| op.name == name)
}
