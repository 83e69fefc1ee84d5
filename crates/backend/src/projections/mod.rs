pub mod p100_business_record;
