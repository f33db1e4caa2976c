mod mobile_service_tests;
mod storage_tests;
