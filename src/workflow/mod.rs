//! Authorization and transition rules for applications and HR requests.

pub mod transitions;

pub use transitions::{
    already_processed, application_rule, authorize_application, may_propose, request_rule,
    ApplicationTransition, ProcessAction, RequestEffect, Verdict,
};
