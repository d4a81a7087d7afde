mod actor_test;
mod channel_test;
