pub mod mobile_service;
pub mod storage;
pub mod subscription;
pub mod vm;
