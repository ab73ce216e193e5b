//! Controller service — the gRPC surface over `core::reconcile`.

pub mod control;

// Include the generated protobuf code.
pub mod proto {
    tonic::include_proto!("transctrl");
}

pub use control::TransmissionControllerImpl;
pub use proto::transmission_controller_server::TransmissionControllerServer;
