mod relation_test;
mod specialize_test;
