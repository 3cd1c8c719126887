//! # MedScan
//!
//! 肺部影像AI辅助分析系统的门面包，重新导出各子模块，供演示程序使用。

pub use medscan_analysis;
pub use medscan_core;
pub use medscan_workflow;
