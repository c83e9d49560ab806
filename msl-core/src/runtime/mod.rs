//! MSL runtime
//!
//! Tree-walking interpreter plus the input-device boundary it drives.

pub mod context;
pub mod device;
pub mod error;
pub mod interpreter;
pub mod pool;
pub mod result;
pub mod value;

pub use context::{metric, CancelToken, ExecutionContext, Metrics};
pub use device::{DeviceCall, DeviceError, InputDevice, RecordedCall, RecordingDevice};
pub use error::{ExecResult, ExecutionError};
pub use interpreter::Interpreter;
pub use result::ExecutionResult;
pub use value::{Binding, Value, Variables};
