//! Clinical-data adapters: FHIR mapping and the HTTP facts provider.

mod fhir_mapper;
mod http_provider;

pub use fhir_mapper::FhirFactsMapper;
pub use http_provider::HttpFactsProvider;
