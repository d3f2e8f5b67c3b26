// crates/odx-converter/src/resolver/comm.rs

//! Conversion of services, requests and responses.

use super::data::params;
use super::linker::{select_request, select_response, Linker};
use crate::diagnostics::{Diagnostics, Location};
use crate::model::{DiagService, Message};
use crate::types;
use odx_records::ResponseKind;

pub(super) fn service(
    service: &DiagService,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::Service {
    let request = service.request_ref.as_ref().map(|l| {
        linker.link(&l.id_ref, "REQUEST-REF", "REQUEST", site, diagnostics, select_request)
    });
    let pos_responses = service
        .pos_response_refs
        .iter()
        .flat_map(|r| r.items.iter())
        .map(|l| {
            linker.link(
                &l.id_ref,
                "POS-RESPONSE-REF",
                "response",
                site,
                diagnostics,
                select_response,
            )
        })
        .collect();
    let neg_responses = service
        .neg_response_refs
        .iter()
        .flat_map(|r| r.items.iter())
        .map(|l| {
            linker.link(
                &l.id_ref,
                "NEG-RESPONSE-REF",
                "response",
                site,
                diagnostics,
                select_response,
            )
        })
        .collect();

    types::Service {
        id: service.id.clone(),
        short_name: service.short_name.clone(),
        long_name: service.long_name.as_ref().map(|t| t.as_str().to_string()),
        semantic: service.semantic.clone(),
        addressing: service.addressing.clone(),
        request,
        pos_responses,
        neg_responses,
    }
}

pub(super) fn request(
    message: &Message,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::Request {
    types::Request {
        id: message.id.clone(),
        short_name: message.short_name.clone(),
        params: params(message.params.as_ref(), site, linker, diagnostics),
    }
}

pub(super) fn response(
    kind: ResponseKind,
    message: &Message,
    site: &Location,
    linker: &Linker<'_, '_>,
    diagnostics: &mut Diagnostics,
) -> types::Response {
    types::Response {
        id: message.id.clone(),
        short_name: message.short_name.clone(),
        kind,
        params: params(message.params.as_ref(), site, linker, diagnostics),
    }
}
