pub use log::{debug, trace};

pub use crate::error::{IrError, IrResult};
