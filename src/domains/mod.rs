//! Domains module containing the business logic of the server.
//!
//! The only domain is the tool catalog: what each tool accepts, how a call
//! reaches its handler, and what the handlers do against the cluster.

pub mod tools;
