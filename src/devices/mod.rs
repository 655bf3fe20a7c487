// MIT License - Copyright (c) 2026 Peter Wright
// Status entities decoded from panel replies

pub mod fence;
pub mod output;
pub mod partition;
pub mod zone;
