pub mod response_code_mapper;
