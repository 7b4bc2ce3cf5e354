//! Integration tests for factory discovery and loading over resource files.

use forge_core::{
    load_factories, ArgumentResolver, FactoryClass, FactoryLoader, FactoryType, FailureHandler,
    ForgeError, LoadingContext, Visibility, DEFAULT_RESOURCE_LOCATION,
};
use parking_lot::Mutex;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

trait DummyFactory: Send + std::fmt::Debug {
    fn token(&self) -> String;
}

impl FactoryType for dyn DummyFactory {
    const NAME: &'static str = "forge.test.DummyFactory";
}

trait MessageDigest: Send + std::fmt::Debug {}

impl FactoryType for dyn MessageDigest {
    const NAME: &'static str = "forge.test.MessageDigest";
}

#[derive(Debug)]
struct MyDummyFactory1;

impl DummyFactory for MyDummyFactory1 {
    fn token(&self) -> String {
        "Foo".to_string()
    }
}

#[derive(Debug)]
struct MyDummyFactory2;

impl DummyFactory for MyDummyFactory2 {
    fn token(&self) -> String {
        "Bar".to_string()
    }
}

#[derive(Debug)]
struct ConstructorArgsDummyFactory {
    token: String,
}

impl DummyFactory for ConstructorArgsDummyFactory {
    fn token(&self) -> String {
        self.token.clone()
    }
}

fn write_factories(dir: &TempDir, location: &str, content: &str) {
    let path = dir.path().join(location);
    fs::create_dir_all(path.parent().expect("location has a parent")).unwrap();
    fs::write(path, content).unwrap();
}

/// Context with every test implementation registered. Which of them load is
/// decided by the resource files each test writes.
fn dummy_context(dir: &TempDir) -> Arc<LoadingContext> {
    let context = LoadingContext::isolated([dir.path()]);
    context
        .register(
            FactoryClass::of::<dyn DummyFactory>("forge.test.MyDummyFactory1")
                .with_nullary(Visibility::Public, || Ok(Box::new(MyDummyFactory1)))
                .build(),
        )
        .unwrap();
    context
        .register(
            FactoryClass::of::<dyn DummyFactory>("forge.test.MyDummyFactory2")
                .with_nullary(Visibility::Public, || Ok(Box::new(MyDummyFactory2)))
                .build(),
        )
        .unwrap();
    context
        .register(
            FactoryClass::of::<dyn DummyFactory>("forge.test.ConstructorArgsDummyFactory")
                .with_unary::<String, _>(Visibility::Public, |token| {
                    Ok(Box::new(ConstructorArgsDummyFactory { token }))
                })
                .build(),
        )
        .unwrap();
    context
        .register(
            FactoryClass::of::<dyn DummyFactory>("forge.test.MultipleConstructorArgsDummyFactory")
                .with_unary::<String, _>(Visibility::Crate, |token| {
                    Ok(Box::new(ConstructorArgsDummyFactory { token }))
                })
                .with_binary::<String, bool, _>(Visibility::Crate, |token, _extra| {
                    Ok(Box::new(ConstructorArgsDummyFactory { token }))
                })
                .build(),
        )
        .unwrap();
    context
}

fn tokens(factories: &[Box<dyn DummyFactory>]) -> Vec<String> {
    factories.iter().map(|factory| factory.token()).collect()
}

#[test]
fn load_returns_factories_in_registration_order() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1, forge.test.MyDummyFactory2\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let factories = loader.load::<dyn DummyFactory>().unwrap();

    assert_eq!(tokens(&factories), ["Foo", "Bar"]);
}

#[test]
fn duplicate_registrations_merge_across_roots_in_order() {
    let first = TempDir::new().unwrap();
    let second = TempDir::new().unwrap();
    write_factories(
        &first,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1\n",
    );
    write_factories(
        &second,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1, forge.test.MyDummyFactory2\n",
    );

    let context = LoadingContext::isolated([first.path(), second.path()]);
    context
        .register(
            FactoryClass::of::<dyn DummyFactory>("forge.test.MyDummyFactory1")
                .with_nullary(Visibility::Public, || Ok(Box::new(MyDummyFactory1)))
                .build(),
        )
        .unwrap();
    context
        .register(
            FactoryClass::of::<dyn DummyFactory>("forge.test.MyDummyFactory2")
                .with_nullary(Visibility::Public, || Ok(Box::new(MyDummyFactory2)))
                .build(),
        )
        .unwrap();

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let factories = loader.load::<dyn DummyFactory>().unwrap();

    assert_eq!(tokens(&factories), ["Foo", "Foo", "Bar"]);
}

#[test]
fn factory_type_without_registrations_returns_empty_list() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let digests = loader.load::<dyn MessageDigest>().unwrap();

    assert!(digests.is_empty());
}

#[test]
fn missing_resource_location_returns_empty_list() {
    let dir = TempDir::new().unwrap();
    let context = dummy_context(&dir);

    let loader =
        FactoryLoader::for_resource_location("config/missing/missing.factories", Some(context))
            .unwrap();
    let factories = loader.load::<dyn DummyFactory>().unwrap();

    assert!(factories.is_empty());
}

#[test]
fn incompatible_type_aborts_with_standard_error() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.MessageDigest = forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let error = loader
        .load::<dyn MessageDigest>()
        .expect_err("incompatible implementation must abort");

    let message = error.to_string();
    assert!(message.starts_with("Unable to instantiate factory class"));
    assert!(message.contains("[forge.test.MyDummyFactory1]"));
    assert!(message.contains("[forge.test.MessageDigest]"));

    let source = std::error::Error::source(&error).expect("cause preserved");
    assert!(source.to_string().contains("is not assignable"));
}

#[test]
fn incompatible_type_with_logging_handler_returns_empty_list() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.MessageDigest = forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let digests = loader
        .load_with_failure_handler::<dyn MessageDigest>(&FailureHandler::logging())
        .unwrap();

    assert!(digests.is_empty());
}

#[test]
fn resolver_injects_constructor_arguments() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1, forge.test.MyDummyFactory2, forge.test.ConstructorArgsDummyFactory\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let resolver = ArgumentResolver::of::<String>("injected".to_string());
    let factories = loader.load_with_resolver::<dyn DummyFactory>(&resolver).unwrap();

    assert_eq!(tokens(&factories), ["Foo", "Bar", "injected"]);
}

#[test]
fn missing_argument_with_logging_handler_drops_entry() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1, forge.test.ConstructorArgsDummyFactory, forge.test.MyDummyFactory2\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let factories = loader
        .load_with_failure_handler::<dyn DummyFactory>(&FailureHandler::logging())
        .unwrap();

    assert_eq!(tokens(&factories), ["Foo", "Bar"]);
}

#[test]
fn ambiguous_constructors_propagate_even_with_logging_handler() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1, forge.test.MultipleConstructorArgsDummyFactory\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let resolver = ArgumentResolver::of::<String>("injected".to_string());
    let error = loader
        .load_with::<dyn DummyFactory>(&resolver, &FailureHandler::logging())
        .expect_err("constructor ambiguity is never policy-routed");

    assert!(matches!(error, ForgeError::NoSuitableConstructor { .. }));
    assert!(error.to_string().contains("has no suitable constructor"));
    assert!(error
        .to_string()
        .contains("forge.test.MultipleConstructorArgsDummyFactory"));
}

#[test]
fn handle_message_receives_template_and_preserves_survivors() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.ConstructorArgsDummyFactory, forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let messages: Arc<Mutex<Vec<(String, String)>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let handler = FailureHandler::handle_message(move |message, cause| {
        sink.lock().push((message.to_string(), cause.to_string()));
    });

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let factories = loader
        .load_with_failure_handler::<dyn DummyFactory>(&handler)
        .unwrap();

    assert_eq!(tokens(&factories), ["Foo"]);

    let messages = messages.lock();
    assert_eq!(messages.len(), 1);
    assert!(messages[0]
        .0
        .starts_with("Unable to instantiate factory class"));
    assert!(messages[0].0.contains("forge.test.ConstructorArgsDummyFactory"));
    assert!(messages[0].1.contains("no matching argument"));
}

#[test]
fn throwing_with_uses_caller_supplied_error() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.ConstructorArgsDummyFactory\n",
    );
    let context = dummy_context(&dir);

    let handler = FailureHandler::throwing_with(|message, _cause| {
        ForgeError::configuration("policy", message)
    });

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let error = loader
        .load_with_failure_handler::<dyn DummyFactory>(&handler)
        .expect_err("custom throwing handler must abort");

    assert!(matches!(error, ForgeError::Configuration { .. }));
    assert!(error
        .to_string()
        .contains("Unable to instantiate factory class"));
}

#[test]
fn same_loader_for_null_and_explicit_default_context() {
    let for_null = FactoryLoader::for_default_resource_location(None).unwrap();
    let for_default =
        FactoryLoader::for_default_resource_location(Some(LoadingContext::platform_default()))
            .unwrap();

    assert!(Arc::ptr_eq(&for_null, &for_default));
}

#[test]
fn repeated_loads_are_idempotent_and_reuse_the_cached_loader() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory2, forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let first = FactoryLoader::for_default_resource_location(Some(Arc::clone(&context))).unwrap();
    let second = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    let once = tokens(&first.load::<dyn DummyFactory>().unwrap());
    let twice = tokens(&second.load::<dyn DummyFactory>().unwrap());
    assert_eq!(once, ["Bar", "Foo"]);
    assert_eq!(once, twice);
}

#[test]
fn factory_names_lists_registrations_without_instantiating() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MultipleConstructorArgsDummyFactory, forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let loader = FactoryLoader::for_default_resource_location(Some(context)).unwrap();
    let names = loader.factory_names::<dyn DummyFactory>();

    assert_eq!(
        names,
        [
            "forge.test.MultipleConstructorArgsDummyFactory",
            "forge.test.MyDummyFactory1"
        ]
    );
}

#[test]
fn load_factories_convenience_uses_default_location() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        DEFAULT_RESOURCE_LOCATION,
        "forge.test.DummyFactory = forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let factories = load_factories::<dyn DummyFactory>(Some(context)).unwrap();
    assert_eq!(tokens(&factories), ["Foo"]);
}

#[test]
fn custom_resource_location_loads_its_own_mapping() {
    let dir = TempDir::new().unwrap();
    write_factories(
        &dir,
        "config/custom/custom.factories",
        "forge.test.DummyFactory = forge.test.MyDummyFactory1\n",
    );
    let context = dummy_context(&dir);

    let loader =
        FactoryLoader::for_resource_location("config/custom/custom.factories", Some(context))
            .unwrap();
    let factories = loader.load::<dyn DummyFactory>().unwrap();

    assert_eq!(tokens(&factories), ["Foo"]);
}
