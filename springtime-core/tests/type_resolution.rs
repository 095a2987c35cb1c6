use springtime_core::class::{Class, MethodDefinition};
use springtime_core::config::CoreConfig;
use springtime_core::method_parameter::MethodParameter;
use springtime_core::registry::TypeRegistry;
use springtime_core::resolvable_type::{ResolvableType, ResolvableTypeFactory};
use springtime_core::types::{Type, TypeSchema};

struct Model {
    list: Class,
    map: Class,
    repository: Class,
    user_repository: Class,
    user: Class,
}

fn create_model() -> Model {
    let list = Class::builder("java.util.List")
        .interface()
        .type_parameter("E")
        .build();
    let map = Class::builder("java.util.Map")
        .interface()
        .type_parameter("K")
        .type_parameter("V")
        .build();
    let user = Class::builder("test.User").build();

    let builder = Class::builder("test.Repository").type_parameter("T");
    let element = builder.variable("T");
    let repository = builder
        .field(
            "index",
            Type::parameterized(
                map.clone(),
                vec![
                    Type::class(Class::string()),
                    Type::parameterized(list.clone(), vec![element.clone()]),
                ],
            ),
        )
        .method(
            MethodDefinition::new("save_all")
                .parameter(Type::parameterized(list.clone(), vec![element]))
                .parameter_names(["entities"]),
        )
        .build();

    let user_repository = Class::builder("test.UserRepository")
        .extends(Type::parameterized(
            repository.clone(),
            vec![Type::class(user.clone())],
        ))
        .build();

    Model {
        list,
        map,
        repository,
        user_repository,
        user,
    }
}

#[test]
fn should_resolve_inherited_members() {
    let model = create_model();
    let factory = ResolvableTypeFactory::from_config(&CoreConfig::default());

    let index = model.repository.declared_field("index").unwrap();
    let ty = factory
        .for_field_with_implementation(&index, &model.user_repository)
        .unwrap();

    assert_eq!(ty.resolve(), Some(model.map.clone()));
    assert_eq!(ty.resolve_generic(&[1]), Some(model.list.clone()));
    assert_eq!(ty.resolve_generic(&[1, 0]), Some(model.user.clone()));
    assert_eq!(
        ty.to_string(),
        "java.util.Map<java.lang.String, java.util.List<test.User>>"
    );

    let save_all = model.repository.method_named("save_all").unwrap();
    let parameter = MethodParameter::for_method(save_all, 0)
        .unwrap()
        .with_containing_class(model.user_repository.clone());
    let parameter_type = factory.for_method_parameter(&parameter).unwrap();
    assert_eq!(parameter_type.resolve_generic(&[0]), Some(model.user.clone()));

    let expected = factory
        .for_class_with_generic_classes(&model.list, &[model.user.clone()])
        .unwrap();
    assert!(expected.is_assignable_from(&parameter_type));
    assert!(parameter_type.is_assignable_from(&expected));
}

#[test]
fn should_restore_persisted_nested_types() {
    let model = create_model();
    let factory = ResolvableTypeFactory::from_config(&CoreConfig::default());

    let index = model.repository.declared_field("index").unwrap();
    let ty = factory.for_field(&index).unwrap();
    let nested = ty.get_generic(&[1]);
    assert!(matches!(nested.get_type(), Type::Proxy(_)));

    let json = serde_json::to_string(&nested.get_type().to_schema()).unwrap();
    let schema: TypeSchema = serde_json::from_str(&json).unwrap();

    let mut registry = TypeRegistry::default();
    registry.register(model.list.clone());
    registry.register(model.map.clone());
    registry.register(model.repository.clone());

    let restored = factory.for_type(registry.resolve_type(&schema).unwrap());
    assert_eq!(restored, nested);
    assert_eq!(restored.resolve(), Some(model.list));
    assert_eq!(restored.resolve_generic(&[0]), None);
}

#[test]
fn should_work_without_type_wrapping() {
    let model = create_model();
    let mut config = CoreConfig::default();
    config.type_wrapping_enabled = false;

    let factory = ResolvableTypeFactory::from_config(&config);
    let index = model.repository.declared_field("index").unwrap();
    let ty = factory.for_field(&index).unwrap();

    assert!(!matches!(ty.get_type(), Type::Proxy(_)));
    assert_eq!(ty.get_type(), index.generic_type());
    assert_eq!(ty.resolve_generic(&[1]), Some(model.list));
    assert!(ResolvableType::none().resolve().is_none());
}
