use springtime_beans::config::BeanFactoryConfig;
use springtime_beans::definition::internal::{submit, BeanDefinitionRegisterer};
use springtime_beans::definition::BeanDefinition;
use springtime_beans::error::BeansError;
use springtime_beans::factory::{BeanFactory, DefaultBeanFactoryBuilder, TypedBeanFactory};
use springtime_beans::instance::{BeanInstanceAnyPtr, BeanInstancePtr, RustType};
use springtime_core::class::Class;
use springtime_core::config::CoreConfig;
use springtime_core::resolvable_type::ResolvableTypeFactory;

// a dependency we would like to inject into another bean
struct Greeter;

impl Greeter {
    fn greet(&self) {
        println!("Hello world!");
    }
}

struct TestBean {
    greeter: BeanInstancePtr<Greeter>,
}

// constructors receive the factory, so they can ask for their dependencies
fn create_greeter(
    _factory: &dyn BeanFactory,
    _args: &[BeanInstanceAnyPtr],
) -> Result<BeanInstanceAnyPtr, BeansError> {
    Ok(BeanInstancePtr::new(Greeter) as BeanInstanceAnyPtr)
}

fn create_test_bean(
    factory: &dyn BeanFactory,
    _args: &[BeanInstanceAnyPtr],
) -> Result<BeanInstanceAnyPtr, BeansError> {
    Ok(BeanInstancePtr::new(TestBean {
        greeter: factory.get_bean_typed("greeter")?,
    }) as BeanInstanceAnyPtr)
}

// definitions describe the type of a bean, which is used when looking up beans by type
fn greeter_definition(types: &ResolvableTypeFactory) -> BeanDefinition {
    BeanDefinition::new(
        "greeter",
        types.for_class(&Class::builder("demo.Greeter").build()),
        RustType::of::<Greeter>(),
        create_greeter,
    )
}

fn test_bean_definition(types: &ResolvableTypeFactory) -> BeanDefinition {
    BeanDefinition::new(
        "testBean",
        types.for_class(&Class::builder("demo.TestBean").build()),
        RustType::of::<TestBean>(),
        create_test_bean,
    )
}

// statically registered definitions are picked up when the factory is built
submit! {
    BeanDefinitionRegisterer {
        register: greeter_definition,
    }
}

submit! {
    BeanDefinitionRegisterer {
        register: test_bean_definition,
    }
}

// note: for the sake of simplicity, errors are unwrapped, rather than gracefully handled
fn main() {
    let types = ResolvableTypeFactory::from_config(&CoreConfig::default());

    // DefaultBeanFactoryBuilder creates the factory with a reasonable default configuration
    let factory = DefaultBeanFactoryBuilder::new(&BeanFactoryConfig::default(), types)
        .expect("error initializing DefaultBeanFactoryBuilder")
        .build();

    let bean = factory
        .get_bean_of::<TestBean>()
        .expect("error creating TestBean");

    // prints "Hello world!"
    bean.greeter.greet();
}
