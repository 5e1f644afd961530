//! Shared test utilities for retrace-db unit tests.

#[cfg(test)]
pub(crate) mod helpers {
    use retrace_core::record::value_to_record;
    use retrace_core::{EmptyIncomingPolicy, Record, RegistryBuilder, TrackedType};

    use crate::service::HistoryService;

    /// Build a record from a `json!` literal.
    pub fn rec(value: serde_json::Value) -> Record {
        value_to_record(value).unwrap()
    }

    /// In-memory service tracking a single `user` type.
    pub async fn user_service(policy: EmptyIncomingPolicy) -> (HistoryService, TrackedType) {
        let mut builder = RegistryBuilder::new();
        let users = builder.register("User").unwrap();
        let svc = HistoryService::open_local(":memory:", builder.build(), policy)
            .await
            .unwrap();
        (svc, users)
    }
}
