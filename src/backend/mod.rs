//! 백엔드 연결과 헬스 체크

mod connector;
mod error;
mod probe;

pub use connector::BackendConnector;
pub use error::BackendError;
pub use probe::{HttpProbe, LivenessProbe};
