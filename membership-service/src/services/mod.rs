pub mod access_service;
