pub mod config;
pub mod domain {
    pub mod method;
    pub mod order;
    pub mod transaction;
}
pub mod error;
pub mod gateway;
pub mod http {
    pub mod handlers {
        pub mod methods;
        pub mod payments;
    }
}
pub mod metrics;
pub mod store;
pub mod strategy;
pub mod service {
    pub mod payment_service;
}

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub method_registry: domain::method::MethodRegistry,
}
