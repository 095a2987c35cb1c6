// note: this example assumes you've analyzed the previous one

use springtime_beans::config::BeanFactoryConfig;
use springtime_beans::definition::BeanDefinition;
use springtime_beans::error::BeansError;
use springtime_beans::factory::{BeanFactory, DefaultBeanFactoryBuilder};
use springtime_beans::instance::{BeanInstanceAnyPtr, BeanInstancePtr, RustType};
use springtime_core::class::Class;
use springtime_core::config::CoreConfig;
use springtime_core::resolvable_type::ResolvableTypeFactory;
use springtime_core::types::Type;

struct Store {
    content: &'static str,
}

fn create_books(
    _factory: &dyn BeanFactory,
    _args: &[BeanInstanceAnyPtr],
) -> Result<BeanInstanceAnyPtr, BeansError> {
    Ok(BeanInstancePtr::new(Store { content: "books" }) as BeanInstanceAnyPtr)
}

fn create_films(
    _factory: &dyn BeanFactory,
    _args: &[BeanInstanceAnyPtr],
) -> Result<BeanInstanceAnyPtr, BeansError> {
    Ok(BeanInstancePtr::new(Store { content: "films" }) as BeanInstanceAnyPtr)
}

fn main() {
    let types = ResolvableTypeFactory::from_config(&CoreConfig::default());

    // Rust types are erased here on purpose - both beans are Stores, so only the generic type
    // model can tell them apart
    let store = Class::builder("demo.Store").type_parameter("T").build();
    let book = Class::builder("demo.Book").build();
    let film = Class::builder("demo.Film").build();

    let store_of = |item: &Class| {
        types.for_type(Type::parameterized(
            store.clone(),
            vec![Type::class(item.clone())],
        ))
    };

    // definitions can also be registered manually, when building the factory
    let factory = DefaultBeanFactoryBuilder::new(&BeanFactoryConfig::default(), types.clone())
        .expect("error initializing DefaultBeanFactoryBuilder")
        .with_definition(
            BeanDefinition::new(
                "books",
                store_of(&book),
                RustType::of::<Store>(),
                create_books,
            )
            .with_order(2),
        )
        .expect("error registering books")
        .with_definition(
            BeanDefinition::new(
                "films",
                store_of(&film),
                RustType::of::<Store>(),
                create_films,
            )
            .with_order(1),
        )
        .expect("error registering films")
        .build();

    // prints "films"
    let films = factory
        .get_bean_of_type(&store_of(&film))
        .expect("error creating film store")
        .downcast::<Store>()
        .expect("unexpected bean type");
    println!("{}", films.content);

    // the raw type matches both stores, so we can iterate over them in order
    // prints "films" and "books"
    let provider = factory.get_bean_provider(types.for_class(&store));
    for instance in provider.ordered_stream().expect("error accessing stores") {
        let instance = instance
            .expect("error creating store")
            .downcast::<Store>()
            .expect("unexpected bean type");
        println!("{}", instance.content);
    }
}
