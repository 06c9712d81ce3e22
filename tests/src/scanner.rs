mod invoker;
